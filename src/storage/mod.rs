// src/storage/mod.rs
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::extractors::content::ContentCounts;
use crate::extractors::models::{ContentItem, TocEntry};
use crate::utils::error::StorageError;
use crate::validation::ValidationReport;

pub const TOC_FILE: &str = "toc.jsonl";
pub const CONTENT_FILE: &str = "content.jsonl";
pub const VALIDATION_REPORT_FILE: &str = "validation_report.json";
pub const PARSING_REPORT_FILE: &str = "parsing_report.json";
pub const DEBUG_DIR: &str = "debug";

const SEARCH_PREVIEW_CHARS: usize = 100;

/// Run summary written next to the outputs.
#[derive(Debug, Clone, Serialize)]
pub struct ParsingReport {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub validation: ReportValidation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub generated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub pages: usize,
    pub words: usize,
    pub toc_entries: usize,
    pub content_items: usize,
    pub counts: ContentCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportValidation {
    pub status: String,
}

impl ReportValidation {
    pub fn from_report(report: Option<&ValidationReport>) -> Self {
        let status = match report {
            Some(r) if !r.validation_passed => "FAIL",
            _ => "PASS",
        };
        Self { status: status.to_string() }
    }
}

/// One match from [`search_content`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub line: usize,
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes one JSON object per line. Existing files are replaced.
    pub fn write_jsonl<T: Serialize>(&self, filename: &str, records: &[T]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);
        let mut buffer = Vec::new();

        for record in records {
            serde_json::to_writer(&mut buffer, record)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            buffer.push(b'\n');
        }

        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(&buffer).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} records to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved {}", file_path.display());
        Ok(file_path)
    }

    pub fn save_toc(&self, entries: &[TocEntry]) -> Result<PathBuf, StorageError> {
        self.write_jsonl(TOC_FILE, entries)
    }

    pub fn save_content(&self, items: &[ContentItem]) -> Result<PathBuf, StorageError> {
        self.write_jsonl(CONTENT_FILE, items)
    }

    pub fn save_validation_report(&self, report: &ValidationReport) -> Result<PathBuf, StorageError> {
        self.write_json(VALIDATION_REPORT_FILE, report)
    }

    pub fn save_parsing_report(&self, report: &ParsingReport) -> Result<PathBuf, StorageError> {
        self.write_json(PARSING_REPORT_FILE, report)
    }

    /// Returns the debug directory, creating it if needed.
    pub fn debug_dir(&self) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(DEBUG_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(StorageError::IoError)?;
        }
        Ok(dir)
    }
}

/// Reads a TOC JSONL file back into entries. Any malformed line fails the read.
pub fn read_toc<P: AsRef<Path>>(path: P) -> Result<Vec<TocEntry>, StorageError> {
    let raw = fs::read_to_string(path.as_ref()).map_err(StorageError::IoError)?;
    let mut entries = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: TocEntry = serde_json::from_str(line).map_err(|e| StorageError::MalformedRecord {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        entries.push(entry);
    }

    tracing::debug!("Read {} TOC entries from {}", entries.len(), path.as_ref().display());
    Ok(entries)
}

/// Collects the pages present in a content JSONL file. Unparseable lines are skipped.
pub fn read_content_pages<P: AsRef<Path>>(path: P) -> Result<BTreeSet<u32>, StorageError> {
    let raw = fs::read_to_string(path.as_ref()).map_err(StorageError::IoError)?;
    Ok(raw
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|value| value.get("page").and_then(|p| p.as_u64()))
        .filter_map(|page| u32::try_from(page).ok())
        .filter(|page| *page > 0)
        .collect())
}

/// Case-insensitive substring search over a content JSONL file.
pub fn search_content<P: AsRef<Path>>(
    path: P,
    term: &str,
    max_results: usize,
) -> Result<Vec<SearchHit>, StorageError> {
    let raw = fs::read_to_string(path.as_ref()).map_err(StorageError::IoError)?;
    let needle = term.to_lowercase();
    let mut hits = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        if hits.len() >= max_results {
            break;
        }
        let Ok(item) = serde_json::from_str::<ContentItem>(line) else {
            continue;
        };
        if !item.content.to_lowercase().contains(&needle) {
            continue;
        }
        hits.push(SearchHit {
            line: idx + 1,
            page: item.page,
            kind: item.kind.as_str().to_string(),
            content: preview(&item.content),
        });
    }

    tracing::info!("Found {} matches for '{}'", hits.len(), term);
    Ok(hits)
}

fn preview(content: &str) -> String {
    if content.chars().count() <= SEARCH_PREVIEW_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(SEARCH_PREVIEW_CHARS).collect();
    format!("{}...", head)
}
