// src/source/loader.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::source::models::{ContentBlock, PageText};
use crate::utils::error::SourceError;

// pdftotext separates pages with form feeds.
const PAGE_BREAK: char = '\u{000C}';

// Last run of digits in a file stem: "page_0007" -> 7.
static PAGE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\D*$").expect("Failed to compile PAGE_NUMBER_RE"));

/// Loads per-page text produced by the extraction collaborator.
///
/// Accepts either one text file with form-feed page breaks or a directory of
/// numbered `*.txt` files. Directory pages are read by a bounded pool of
/// tasks and handed back in ascending page order.
#[derive(Debug, Clone)]
pub struct PageLoader {
    path: PathBuf,
    max_pages: Option<usize>,
    workers: usize,
    timeout: Duration,
}

impl PageLoader {
    pub fn new<P: AsRef<Path>>(path: P, workers: usize, timeout_secs: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_pages: None,
            workers: workers.max(1),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Loads all pages, bounded by the run-level timeout.
    pub async fn load(&self) -> Result<Vec<PageText>, SourceError> {
        tracing::info!("Loading pages from {}", self.path.display());
        match tokio::time::timeout(self.timeout, self.load_pages()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Page extraction from {} timed out", self.path.display());
                Err(SourceError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn load_pages(&self) -> Result<Vec<PageText>, SourceError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| not_found_or_io(&self.path, e))?;

        let pages = if metadata.is_dir() {
            self.load_directory().await?
        } else {
            self.load_single_file().await?
        };

        tracing::info!("Loaded {} pages from {}", pages.len(), self.path.display());
        Ok(pages)
    }

    async fn load_single_file(&self) -> Result<Vec<PageText>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let text = String::from_utf8_lossy(&bytes);

        let mut chunks: Vec<&str> = text.split(PAGE_BREAK).collect();
        // A trailing form feed leaves an empty final chunk.
        if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
            chunks.pop();
        }
        if chunks.len() == 1 && chunks[0].trim().is_empty() {
            return Ok(Vec::new());
        }

        let limit = self.max_pages.unwrap_or(usize::MAX);
        Ok(chunks
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, chunk)| PageText { page: i as u32 + 1, text: chunk.to_string() })
            .collect())
    }

    async fn load_directory(&self) -> Result<Vec<PageText>, SourceError> {
        let mut files: Vec<(u32, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            match page_number_from_path(&path) {
                Some(page) if page > 0 => files.push((page, path)),
                _ => tracing::warn!("Skipping {}: no page number in file name", path.display()),
            }
        }

        files.sort();
        files.dedup_by(|later, first| {
            let duplicate = later.0 == first.0;
            if duplicate {
                tracing::warn!("Ignoring {}: page {} already provided", later.1.display(), later.0);
            }
            duplicate
        });
        if let Some(limit) = self.max_pages {
            files.truncate(limit);
        }

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut workers = JoinSet::new();
        let expected = files.len();

        for (page, path) in files {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| SourceError::Worker(e.to_string()))?;
            workers.spawn(async move {
                let _permit = permit;
                let bytes = tokio::fs::read(&path).await?;
                tracing::trace!("Read page {} from {}", page, path.display());
                Ok::<PageText, SourceError>(PageText {
                    page,
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                })
            });
        }

        let mut pages = Vec::with_capacity(expected);
        while let Some(joined) = workers.join_next().await {
            let page = joined.map_err(|e| SourceError::Worker(e.to_string()))??;
            pages.push(page);
        }

        // Workers finish in any order; parsing needs document order.
        pages.sort_by_key(|p| p.page);
        Ok(pages)
    }
}

/// Reads collaborator blocks from a JSONL file. Malformed lines are skipped.
pub async fn load_blocks<P: AsRef<Path>>(path: P) -> Result<Vec<ContentBlock>, SourceError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| not_found_or_io(path, e))?;

    let mut blocks = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ContentBlock>(line) {
            Ok(block) if block.page > 0 => blocks.push(block),
            Ok(block) => tracing::warn!("Skipping block {} with page 0", block.block_id),
            Err(e) => tracing::warn!("Skipping malformed block at line {}: {}", idx + 1, e),
        }
    }

    tracing::info!("Loaded {} content blocks from {}", blocks.len(), path.display());
    Ok(blocks)
}

fn page_number_from_path(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    PAGE_NUMBER_RE
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn not_found_or_io(path: &Path, e: std::io::Error) -> SourceError {
    if e.kind() == std::io::ErrorKind::NotFound {
        SourceError::InputNotFound(path.display().to_string())
    } else {
        SourceError::Io(e)
    }
}
