// src/source/models.rs
use serde::{Deserialize, Serialize};

/// Plain text of one page as produced by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32, // 1-based
    pub text: String,
}

impl PageText {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[serde(alias = "text")]
    Paragraph,
    Image,
    Table,
}

/// A structured block handed over by the extraction collaborator (content mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: String,
    pub page: u32,
    pub block_id: String,
    #[serde(default)]
    pub bbox: Vec<f32>,
}

impl ContentBlock {
    /// Width and height of the bounding box, if it has four coordinates.
    pub fn size(&self) -> Option<(f32, f32)> {
        match self.bbox.as_slice() {
            [x0, y0, x1, y1] => Some((x1 - x0, y1 - y0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_deserialization() {
        let raw = r#"{"type":"text","content":"Hello","page":3,"block_id":"p3_1","bbox":[0,0,100,20]}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        assert_eq!(block.kind, BlockKind::Paragraph);
        assert_eq!(block.size(), Some((100.0, 20.0)));

        let raw = r#"{"type":"image","page":4,"block_id":"img4_0"}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        assert_eq!(block.kind, BlockKind::Image);
        assert_eq!(block.size(), None);
    }
}
