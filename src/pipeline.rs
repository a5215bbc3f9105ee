// src/pipeline.rs
//! Wires page loading, TOC extraction, content classification, validation and storage.

use std::collections::BTreeSet;
use std::path::Path;

use crate::extractors::content::{derive_blocks, ContentCounts, ContentExtractor};
use crate::extractors::models::{ContentItem, TocEntry};
use crate::extractors::toc::{deduplicate, LineTrace, ScanStats, TocExtractor};
use crate::source::models::{ContentBlock, PageText};
use crate::source::{load_blocks, PageLoader};
use crate::storage::{
    read_content_pages, read_toc, ParsingReport, ReportMetadata, ReportSummary, ReportValidation,
    StorageManager,
};
use crate::utils::config::Config;
use crate::utils::debug::save_debug_trace;
use crate::utils::error::AppError;
use crate::validation::{validate_iter, ValidationReport, Validator};

const TRACE_FILE: &str = "toc_trace.txt";

/// Output of the TOC half of a run.
#[derive(Debug, Clone)]
pub struct TocOutcome {
    /// Entries that survived deduplication and the strict pass.
    pub entries: Vec<TocEntry>,
    /// Report over the deduplicated sequence, before the strict pass.
    pub report: ValidationReport,
    pub stats: ScanStats,
    pub trace: Vec<LineTrace>,
}

/// What a pipeline run produced, for the final log line.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub pages: usize,
    pub toc_entries: usize,
    pub content_items: usize,
    pub report: Option<ValidationReport>,
}

/// scan -> dedup -> structural report -> strict filter.
pub fn build_toc(
    pages: &[PageText],
    config: &Config,
    content_pages: Option<&BTreeSet<u32>>,
    collect_trace: bool,
) -> TocOutcome {
    let scan_limit = config.toc_scan_pages.unwrap_or(usize::MAX).min(pages.len());
    let scan = TocExtractor::new(config.doc_title.as_str(), &config.limits)
        .with_trace(collect_trace)
        .extract(&pages[..scan_limit]);

    let unique = deduplicate(scan.entries);
    let report = Validator::validate(&unique, content_pages);
    let mut strict = validate_iter(unique, &config.limits);
    let entries: Vec<TocEntry> = strict.by_ref().collect();
    if strict.dropped() > 0 {
        tracing::info!("Dropped {} invalid entries during validation", strict.dropped());
    }

    TocOutcome {
        entries,
        report,
        stats: scan.stats,
        trace: scan.trace,
    }
}

/// Classifies blocks, skipping any beyond `max_pages`.
pub fn build_content(blocks: &[ContentBlock], config: &Config) -> Vec<ContentItem> {
    let extractor = ContentExtractor::new(config.doc_title.as_str());
    match config.max_pages {
        Some(limit) => {
            let kept: Vec<ContentBlock> = blocks
                .iter()
                .filter(|b| (b.page as usize) <= limit)
                .cloned()
                .collect();
            extractor.extract(&kept)
        }
        None => extractor.extract(blocks),
    }
}

/// Re-validates a written TOC file, optionally against a content file's pages.
pub fn validate_toc_file(toc_path: &Path, content_path: Option<&Path>) -> Result<ValidationReport, AppError> {
    let entries = read_toc(toc_path)?;
    if let Some(first) = entries.first() {
        tracing::info!("Validating {} entries of '{}'", entries.len(), first.doc_title());
    }
    let content_pages = content_path.map(read_content_pages).transpose()?;
    Ok(Validator::validate(&entries, content_pages.as_ref()))
}

pub struct Pipeline {
    config: Config,
    storage: StorageManager,
    debug: bool,
}

impl Pipeline {
    pub fn new(config: Config, debug: bool) -> Result<Self, AppError> {
        let storage = StorageManager::new(&config.output_directory)?;
        Ok(Self { config, storage, debug })
    }

    async fn load_pages(&self) -> Result<Vec<PageText>, AppError> {
        let pages = PageLoader::new(
            &self.config.input_path,
            self.config.workers,
            self.config.extraction_timeout_secs,
        )
        .with_max_pages(self.config.max_pages)
        .load()
        .await?;

        if pages.is_empty() {
            tracing::warn!("No pages found in {}", self.config.input_path.display());
        }
        Ok(pages)
    }

    async fn load_content_blocks(&self, pages: &[PageText]) -> Result<Vec<ContentBlock>, AppError> {
        match &self.config.blocks_path {
            Some(path) => Ok(load_blocks(path).await?),
            None => {
                let blocks = derive_blocks(pages);
                tracing::debug!("Derived {} blocks from page text", blocks.len());
                Ok(blocks)
            }
        }
    }

    fn save_toc_outcome(&self, outcome: &TocOutcome) -> Result<(), AppError> {
        self.storage.save_toc(&outcome.entries)?;
        self.storage.save_validation_report(&outcome.report)?;

        if self.debug {
            let path = self.storage.debug_dir()?.join(TRACE_FILE);
            save_debug_trace(&outcome.trace, &path)?;
            tracing::debug!("Scan statistics: {:?}", outcome.stats);
        }
        Ok(())
    }

    /// TOC only. No content pages exist, so the missing-page check is skipped.
    pub async fn run_toc(&self) -> Result<RunSummary, AppError> {
        let pages = self.load_pages().await?;
        let outcome = build_toc(&pages, &self.config, None, self.debug);
        self.save_toc_outcome(&outcome)?;

        Ok(RunSummary {
            pages: pages.len(),
            toc_entries: outcome.entries.len(),
            content_items: 0,
            report: Some(outcome.report),
        })
    }

    pub async fn run_content(&self) -> Result<RunSummary, AppError> {
        let pages = self.load_pages().await?;
        let blocks = self.load_content_blocks(&pages).await?;
        let items = build_content(&blocks, &self.config);
        self.storage.save_content(&items)?;

        Ok(RunSummary {
            pages: pages.len(),
            toc_entries: 0,
            content_items: items.len(),
            report: None,
        })
    }

    /// Content first, so the TOC report can check pages against it.
    pub async fn run_full(&self) -> Result<RunSummary, AppError> {
        let pages = self.load_pages().await?;
        let blocks = self.load_content_blocks(&pages).await?;
        let items = build_content(&blocks, &self.config);
        let content_pages: BTreeSet<u32> = items.iter().map(|item| item.page).collect();

        let outcome = build_toc(&pages, &self.config, Some(&content_pages), self.debug);
        self.save_toc_outcome(&outcome)?;
        self.storage.save_content(&items)?;

        let report = ParsingReport {
            metadata: ReportMetadata {
                title: self.config.doc_title.clone(),
                generated: chrono::Utc::now().to_rfc3339(),
            },
            summary: ReportSummary {
                pages: pages.len(),
                words: pages.iter().map(PageText::word_count).sum(),
                toc_entries: outcome.entries.len(),
                content_items: items.len(),
                counts: ContentCounts::from_items(&items),
            },
            validation: ReportValidation::from_report(Some(&outcome.report)),
        };
        self.storage.save_parsing_report(&report)?;

        Ok(RunSummary {
            pages: pages.len(),
            toc_entries: outcome.entries.len(),
            content_items: items.len(),
            report: Some(outcome.report),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::models::ContentType;
    use std::fs;

    const COVER: &str = "Universal Serial Bus\nPower Delivery Specification\nRevision 3.0\n5 July 2012\n";
    const TOC: &str = "\
Table of Contents
1 Introduction ........................ 3
1.1 Overview .......................... 3
2 Architecture ........................ 4
2.1 Power Roles ....................... 1999
2.2 Messages .......................... 4
1.1 Overview .......................... 3
3 Appendix ............................ 2
";
    const BODY_3: &str = "1 Introduction\nThe Source shall send messages.\n\nPower flows from provider to consumer.\n";
    const BODY_4: &str = "2 Architecture\nEach packet carries a CRC.\n";

    fn pages() -> Vec<PageText> {
        [COVER, TOC, BODY_3, BODY_4]
            .iter()
            .enumerate()
            .map(|(i, text)| PageText { page: i as u32 + 1, text: text.to_string() })
            .collect()
    }

    fn ids(entries: &[TocEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.section_id()).collect()
    }

    #[test]
    fn test_build_toc_reports_before_strict_pass() {
        let outcome = build_toc(&pages(), &Config::default(), None, false);

        assert_eq!(outcome.report.total_entries, 6);
        assert!(outcome.report.duplicates.is_empty());
        assert_eq!(outcome.report.out_of_order, vec!["2.2".to_string(), "3".to_string()]);
        assert_eq!(outcome.report.duplicate_pages, vec![3, 4]);
        assert!(!outcome.report.validation_passed);

        assert_eq!(ids(&outcome.entries), vec!["1", "1.1", "2", "2.2", "3"]);
        assert_eq!(outcome.entries[1].parent_id(), Some("1"));
        assert!(outcome.trace.is_empty());
    }

    #[test]
    fn test_toc_scan_pages_limits_scan() {
        let config = Config { toc_scan_pages: Some(1), ..Config::default() };
        let outcome = build_toc(&pages(), &config, None, true);
        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.stats.pages, 1);
        assert!(outcome.report.validation_passed);
    }

    #[test]
    fn test_build_content_honours_max_pages() {
        let blocks = derive_blocks(&pages());
        let all = build_content(&blocks, &Config::default());
        assert_eq!(all.len(), 5);
        assert_eq!(all[2].kind, ContentType::Requirement);

        let config = Config { max_pages: Some(2), ..Config::default() };
        let limited = build_content(&blocks, &config);
        assert_eq!(limited.len(), 2);
        assert!(limited.iter().all(|item| item.page <= 2));
    }

    #[test]
    fn test_full_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        fs::write(&input, [COVER, TOC, BODY_3, BODY_4].join("\u{000C}")).unwrap();

        let config = Config {
            input_path: input,
            output_directory: dir.path().join("out"),
            ..Config::default()
        };
        let pipeline = Pipeline::new(config, true).unwrap();
        let summary = tokio_test::block_on(pipeline.run_full()).unwrap();

        assert_eq!(summary.pages, 4);
        assert_eq!(summary.toc_entries, 5);
        assert_eq!(summary.content_items, 5);

        let out = dir.path().join("out");
        let toc = fs::read_to_string(out.join("toc.jsonl")).unwrap();
        assert_eq!(toc.lines().count(), 5);
        assert_eq!(fs::read_to_string(out.join("content.jsonl")).unwrap().lines().count(), 5);
        assert!(out.join("debug").join(TRACE_FILE).is_file());

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("parsing_report.json")).unwrap()).unwrap();
        assert_eq!(report["summary"]["toc_entries"], 5);
        assert_eq!(report["summary"]["counts"]["pages"], 4);
        assert_eq!(report["validation"]["status"], "FAIL");

        let revalidated = validate_toc_file(&out.join("toc.jsonl"), Some(&out.join("content.jsonl"))).unwrap();
        assert_eq!(revalidated.total_entries, 5);
        assert_eq!(revalidated.out_of_order, vec!["3".to_string()]);
        assert!(revalidated.missing_pages.is_empty());
    }

    #[test]
    fn test_toc_run_skips_content() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        fs::write(&input, [COVER, TOC].join("\u{000C}")).unwrap();

        let config = Config {
            input_path: input,
            output_directory: dir.path().join("out"),
            ..Config::default()
        };
        let summary = tokio_test::block_on(Pipeline::new(config, false).unwrap().run_toc()).unwrap();
        assert_eq!(summary.toc_entries, 5);
        assert!(dir.path().join("out/validation_report.json").is_file());
        assert!(!dir.path().join("out/content.jsonl").exists());
        assert!(!dir.path().join("out/debug").exists());
    }

    #[test]
    fn test_content_run_uses_blocks_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.txt");
        fs::write(&input, COVER).unwrap();
        let blocks = dir.path().join("blocks.jsonl");
        fs::write(
            &blocks,
            r#"{"type":"table","content":"a | b","page":1,"block_id":"tbl1_0"}"#,
        )
        .unwrap();

        let config = Config {
            input_path: input,
            blocks_path: Some(blocks),
            output_directory: dir.path().join("out"),
            ..Config::default()
        };
        let summary = tokio_test::block_on(Pipeline::new(config, false).unwrap().run_content()).unwrap();
        assert_eq!(summary.content_items, 1);

        let raw = fs::read_to_string(dir.path().join("out/content.jsonl")).unwrap();
        let item: ContentItem = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(item.kind, ContentType::Table);
        assert_eq!(item.block_id, "tbl1_0");
        assert_eq!(item.content_id, "C1");
    }
}
