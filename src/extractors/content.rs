// src/extractors/content.rs
//! Classification of page blocks into content records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::extractors::models::{ContentItem, ContentMetadata, ContentType};
use crate::source::models::{BlockKind, ContentBlock, PageText};
use crate::utils::text::{clean_text, normalize_line};

static NUMBERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.").expect("Failed to compile NUMBERED_ITEM_RE"));

static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[•●◦▪‣∙*\-]|[a-z]\))").expect("Failed to compile BULLET_RE")
});

const DEFINITION_PREFIX_MAX: usize = 50;
const MIN_IMAGE_SIDE: f32 = 10.0;
const MIN_TABLE_CHARS: usize = 100;
const MIN_TABLE_RUN: usize = 3;

// Order is significant: the first label with a matching keyword wins.
const KEYWORD_RULES: [(ContentType, &[&str]); 6] = [
    (ContentType::Requirement, &["shall", "must", "required"]),
    (ContentType::Recommendation, &["may", "should", "recommended"]),
    (ContentType::Note, &["note:", "warning:", "caution:"]),
    (ContentType::Heading, &["table", "figure", "section"]),
    (ContentType::Technical, &["protocol", "message", "packet"]),
    (ContentType::Procedure, &["step", "procedure", "algorithm"]),
];

/// Two-layer label assignment: structure first, then keywords, then `paragraph`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> ContentType {
        let text = text.trim();
        self.structural(text)
            .or_else(|| self.semantic(text))
            .unwrap_or(ContentType::Paragraph)
    }

    fn structural(&self, text: &str) -> Option<ContentType> {
        if NUMBERED_ITEM_RE.is_match(text) {
            return Some(ContentType::NumberedItem);
        }
        if BULLET_RE.is_match(text) {
            return Some(ContentType::BulletPoint);
        }
        if let Some((prefix, _)) = text.split_once(':') {
            if prefix.chars().count() < DEFINITION_PREFIX_MAX {
                return Some(ContentType::Definition);
            }
        }
        if text.contains('|') || text.matches('\t').count() >= 2 {
            return Some(ContentType::TableData);
        }
        None
    }

    fn semantic(&self, text: &str) -> Option<ContentType> {
        let lower = text.to_lowercase();
        KEYWORD_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(label, _)| *label)
    }
}

/// Per-type totals of one content run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentCounts {
    pub paragraphs: usize,
    pub images: usize,
    pub tables: usize,
    pub pages: u32,
}

impl ContentCounts {
    pub fn from_items(items: &[ContentItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            match item.kind {
                ContentType::Image => counts.images += 1,
                ContentType::Table => counts.tables += 1,
                _ => counts.paragraphs += 1,
            }
            counts.pages = counts.pages.max(item.page);
        }
        counts
    }
}

/// Turns collaborator blocks into classified content items.
pub struct ContentExtractor {
    doc_title: String,
    classifier: ContentClassifier,
}

impl ContentExtractor {
    pub fn new(doc_title: impl Into<String>) -> Self {
        Self {
            doc_title: doc_title.into(),
            classifier: ContentClassifier::new(),
        }
    }

    /// Blocks are expected in page/block order; items keep that order.
    pub fn extract(&self, blocks: &[ContentBlock]) -> Vec<ContentItem> {
        let extracted_at = chrono::Utc::now().to_rfc3339();
        let mut items = Vec::with_capacity(blocks.len());

        for block in blocks {
            let Some((kind, content)) = self.label(block) else {
                continue;
            };
            let content_length = content.chars().count();
            items.push(ContentItem {
                doc_title: self.doc_title.clone(),
                content_id: format!("C{}", items.len() + 1),
                kind,
                content,
                page: block.page,
                block_id: block.block_id.clone(),
                bbox: block.bbox.clone(),
                metadata: ContentMetadata {
                    extracted_at: extracted_at.clone(),
                    content_length,
                },
            });
        }

        tracing::info!("Classified {} content items from {} blocks", items.len(), blocks.len());
        items
    }

    fn label(&self, block: &ContentBlock) -> Option<(ContentType, String)> {
        match block.kind {
            BlockKind::Paragraph => {
                let text = block.content.trim();
                if text.is_empty() {
                    return None;
                }
                Some((self.classifier.classify(text), clean_text(text)))
            }
            BlockKind::Table => {
                let text = block.content.trim();
                (!text.is_empty()).then(|| (ContentType::Table, text.to_string()))
            }
            BlockKind::Image => {
                let (width, height) = block.size()?;
                if width <= MIN_IMAGE_SIDE || height <= MIN_IMAGE_SIDE {
                    tracing::debug!("Skipping decorative image {} ({:.0}x{:.0})", block.block_id, width, height);
                    return None;
                }
                let content = if block.content.trim().is_empty() {
                    format!("[Image {:.0}x{:.0} on page {}]", width, height, block.page)
                } else {
                    block.content.trim().to_string()
                };
                Some((ContentType::Image, content))
            }
        }
    }
}

/// Splits page text into blocks when the collaborator supplies no structure:
/// blank-line separated chunks become paragraphs, tabular chunks become tables.
pub fn derive_blocks(pages: &[PageText]) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();

    for page in pages {
        let lines: Vec<String> = page.text.lines().map(normalize_line).collect();
        let chunks = lines
            .split(|line| line.trim().is_empty())
            .filter(|chunk| !chunk.is_empty());

        for (idx, chunk) in chunks.enumerate() {
            let content = chunk.iter().map(|l| l.trim_end()).collect::<Vec<_>>().join("\n");
            let (kind, prefix) = if is_table_chunk(chunk, &content) {
                (BlockKind::Table, "tbl")
            } else {
                (BlockKind::Paragraph, "p")
            };
            blocks.push(ContentBlock {
                kind,
                content,
                page: page.page,
                block_id: format!("{}{}_{}", prefix, page.page, idx),
                bbox: Vec::new(),
            });
        }
    }

    blocks
}

fn is_table_chunk(lines: &[String], content: &str) -> bool {
    if content.trim().chars().count() <= MIN_TABLE_CHARS {
        return false;
    }
    let mut run = 0;
    for line in lines {
        if is_table_like(line.trim()) {
            run += 1;
            if run >= MIN_TABLE_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn is_table_like(line: &str) -> bool {
    line.contains("Table")
        || line.contains("Figure")
        || line.contains('|')
        || line.contains('\t')
        || line.matches("  ").count() >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ContentType {
        ContentClassifier::new().classify(text)
    }

    #[test]
    fn test_structural_layer_wins() {
        assert_eq!(classify("1. The Source shall send"), ContentType::NumberedItem);
        assert_eq!(classify("• Sink must respond"), ContentType::BulletPoint);
        assert_eq!(classify("- a bullet"), ContentType::BulletPoint);
        assert_eq!(classify("b) second option"), ContentType::BulletPoint);
        assert_eq!(classify("tSenderResponse: the time a protocol layer waits"), ContentType::Definition);
        assert_eq!(classify("Note: this field shall be zero"), ContentType::Definition);
        assert_eq!(classify("VBUS | 5V | 3A"), ContentType::TableData);
        assert_eq!(classify("Field\tValue\tUnit"), ContentType::TableData);
    }

    #[test]
    fn test_keyword_layer_order() {
        assert_eq!(classify("The Sink shall request power."), ContentType::Requirement);
        assert_eq!(classify("The Sink should request power."), ContentType::Recommendation);
        assert_eq!(classify("This section describes power roles."), ContentType::Heading);
        assert_eq!(classify("Each packet carries a CRC."), ContentType::Technical);
        assert_eq!(classify("Repeat the procedure twice."), ContentType::Procedure);
        // requirement precedes technical
        assert_eq!(classify("A message is REQUIRED here."), ContentType::Requirement);
    }

    #[test]
    fn test_fallback_is_paragraph() {
        assert_eq!(classify("Power flows from provider to consumer."), ContentType::Paragraph);
    }

    #[test]
    fn test_long_colon_prefix_is_not_definition() {
        let text = format!("{}: trailing", "x".repeat(60));
        assert_eq!(classify(&text), ContentType::Paragraph);
    }

    #[test]
    fn test_extract_labels_and_filters() {
        let blocks = vec![
            ContentBlock { kind: BlockKind::Paragraph, content: "  The Sink shall   respond. ".into(), page: 1, block_id: "p1_0".into(), bbox: vec![1.0, 2.0, 3.0, 4.0] },
            ContentBlock { kind: BlockKind::Paragraph, content: "   ".into(), page: 1, block_id: "p1_1".into(), bbox: vec![] },
            ContentBlock { kind: BlockKind::Image, content: String::new(), page: 2, block_id: "img2_0".into(), bbox: vec![0.0, 0.0, 5.0, 50.0] },
            ContentBlock { kind: BlockKind::Image, content: String::new(), page: 2, block_id: "img2_1".into(), bbox: vec![10.0, 10.0, 210.0, 110.0] },
            ContentBlock { kind: BlockKind::Table, content: "a | b\n1 | 2".into(), page: 3, block_id: "tbl3_0".into(), bbox: vec![] },
        ];

        let items = ContentExtractor::new("Doc").extract(&blocks);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].content_id, "C1");
        assert_eq!(items[0].kind, ContentType::Requirement);
        assert_eq!(items[0].content, "The Sink shall respond.");
        assert_eq!(items[0].metadata.content_length, 23);
        assert_eq!(items[0].bbox, vec![1.0, 2.0, 3.0, 4.0]);

        assert_eq!(items[1].content_id, "C2");
        assert_eq!(items[1].kind, ContentType::Image);
        assert_eq!(items[1].content, "[Image 200x100 on page 2]");

        assert_eq!(items[2].kind, ContentType::Table);
        assert_eq!(items[2].block_id, "tbl3_0");

        let counts = ContentCounts::from_items(&items);
        assert_eq!(counts, ContentCounts { paragraphs: 1, images: 1, tables: 1, pages: 3 });
    }

    #[test]
    fn test_derive_blocks() {
        let table = "Table 6-1 Message Types\nType | Value | Description\nGoodCRC | 0x01 | Acknowledge receipt\nAccept | 0x03 | Accept a request";
        let text = format!("6.1 Messages\nThe protocol layer shall\nforward messages.\n\n{}\n\n\nshort", table);
        let blocks = derive_blocks(&[PageText { page: 9, text }]);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].block_id, "p9_0");
        assert_eq!(blocks[0].content, "6.1 Messages\nThe protocol layer shall\nforward messages.");
        assert_eq!(blocks[1].kind, BlockKind::Table);
        assert_eq!(blocks[1].block_id, "tbl9_1");
        assert_eq!(blocks[2].block_id, "p9_2");
        assert_eq!(blocks[2].content, "short");
    }
}
