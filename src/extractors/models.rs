// src/extractors/models.rs
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractors::hierarchy;
use crate::utils::error::ExtractError;

static SECTION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+(?:\.[A-Za-z0-9]+)*$").expect("Failed to compile SECTION_ID_RE")
});

// --- TOC Entry ---

/// One recognised table-of-contents line.
///
/// The section id is fixed at construction; `level` and `parent_id` are
/// computed from it on demand so they can never drift apart. A level supplied
/// at construction time (e.g. from an outline that carries its own depth)
/// takes precedence over the derived one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TocRecord", try_from = "TocRecord")]
pub struct TocEntry {
    doc_title: String,
    section_id: String,
    title: String,
    page: u32,
    explicit_level: Option<u32>,
    tags: Vec<String>,
}

impl TocEntry {
    pub fn new(
        doc_title: impl Into<String>,
        section_id: &str,
        title: &str,
        page: u32,
    ) -> Result<Self, ExtractError> {
        let section_id = section_id.trim();
        if section_id.is_empty() {
            return Err(ExtractError::EmptySectionId);
        }
        if !SECTION_ID_RE.is_match(section_id) {
            return Err(ExtractError::InvalidSectionId(section_id.to_string()));
        }
        if page == 0 {
            return Err(ExtractError::InvalidPage(section_id.to_string()));
        }

        Ok(Self {
            doc_title: doc_title.into(),
            section_id: section_id.to_string(),
            title: title.trim().to_string(),
            page,
            explicit_level: None,
            tags: Vec::new(),
        })
    }

    /// Overrides the derived level. Ignored for zero or when equal to the derived value.
    pub fn with_level(mut self, level: u32) -> Self {
        self.explicit_level = Some(level).filter(|l| *l > 0 && *l != hierarchy::level_of(&self.section_id));
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn doc_title(&self) -> &str {
        &self.doc_title
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn level(&self) -> u32 {
        self.explicit_level
            .unwrap_or_else(|| hierarchy::level_of(&self.section_id))
    }

    pub fn parent_id(&self) -> Option<&str> {
        hierarchy::parent_of(&self.section_id)
    }

    pub fn full_path(&self) -> String {
        format!("{} {}", self.section_id, self.title)
    }

    /// Key used by the deduplicator.
    pub fn key(&self) -> (&str, u32) {
        (&self.section_id, self.page)
    }
}

impl fmt::Display for TocEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (p. {})", self.full_path(), self.page)
    }
}

/// Flat wire form of a [`TocEntry`], one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocRecord {
    pub doc_title: String,
    pub section_id: String,
    pub title: String,
    pub full_path: String,
    pub page: u32,
    pub level: u32,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<TocEntry> for TocRecord {
    fn from(entry: TocEntry) -> Self {
        Self {
            full_path: entry.full_path(),
            level: entry.level(),
            parent_id: entry.parent_id().map(str::to_string),
            doc_title: entry.doc_title,
            section_id: entry.section_id,
            title: entry.title,
            page: entry.page,
            tags: entry.tags,
        }
    }
}

impl TryFrom<TocRecord> for TocEntry {
    type Error = ExtractError;

    // full_path and parent_id are recomputed rather than trusted.
    fn try_from(record: TocRecord) -> Result<Self, Self::Error> {
        Ok(TocEntry::new(record.doc_title, &record.section_id, &record.title, record.page)?
            .with_level(record.level)
            .with_tags(record.tags))
    }
}

// --- Content Items ---

/// Type tag of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Requirement,
    Recommendation,
    Note,
    Heading,
    Technical,
    Procedure,
    NumberedItem,
    BulletPoint,
    Definition,
    TableData,
    Paragraph,
    Table,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Requirement => "requirement",
            ContentType::Recommendation => "recommendation",
            ContentType::Note => "note",
            ContentType::Heading => "heading",
            ContentType::Technical => "technical",
            ContentType::Procedure => "procedure",
            ContentType::NumberedItem => "numbered_item",
            ContentType::BulletPoint => "bullet_point",
            ContentType::Definition => "definition",
            ContentType::TableData => "table_data",
            ContentType::Paragraph => "paragraph",
            ContentType::Table => "table",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub extracted_at: String,
    pub content_length: usize,
}

/// A classified block from one page, written in extraction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub doc_title: String,
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub content: String,
    pub page: u32,
    pub block_id: String,
    #[serde(default)]
    pub bbox: Vec<f32>,
    pub metadata: ContentMetadata,
}
