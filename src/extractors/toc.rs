// src/extractors/toc.rs
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::extractors::line::{LineClassifier, LineKind};
use crate::extractors::models::TocEntry;
use crate::extractors::patterns::{EntryMatcher, EntryPattern, RawEntry, Rejection};
use crate::source::models::PageText;
use crate::utils::config::Limits;
use crate::utils::text::normalize_line;

/// What happened to one line during a scan (only kept when tracing is on).
#[derive(Debug, Clone, Serialize)]
pub struct LineTrace {
    pub page: u32,
    pub kind: LineKind,
    pub pattern: Option<EntryPattern>,
    pub rejection: Option<Rejection>,
    pub section_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub pages: usize,
    pub lines: usize,
    pub candidates: usize,
    pub matched: usize,
    pub rejected: usize,
    pub kinds: BTreeMap<&'static str, usize>,
}

/// Result of one scan: raw (not yet deduplicated) entries in document order.
#[derive(Debug, Clone, Default)]
pub struct TocScan {
    pub entries: Vec<TocEntry>,
    pub stats: ScanStats,
    pub trace: Vec<LineTrace>,
}

/// Finds TOC entries in page text.
pub struct TocExtractor {
    doc_title: String,
    limits: Limits,
    matcher: EntryMatcher,
    collect_trace: bool,
}

/// State that lives for exactly one extraction run.
struct RunState {
    classifier: LineClassifier,
    synthetic_ids: u32,
}

impl TocExtractor {
    pub fn new(doc_title: impl Into<String>, limits: &Limits) -> Self {
        Self {
            doc_title: doc_title.into(),
            limits: limits.clone(),
            matcher: EntryMatcher::new(limits),
            collect_trace: false,
        }
    }

    pub fn with_trace(mut self, collect_trace: bool) -> Self {
        self.collect_trace = collect_trace;
        self
    }

    /// Scans pages in the given order. Every call starts from a clean run state.
    pub fn extract(&self, pages: &[PageText]) -> TocScan {
        let mut run = RunState {
            classifier: LineClassifier::new(self.limits.min_line_len),
            synthetic_ids: 0,
        };
        let mut scan = TocScan::default();

        for page in pages {
            scan.stats.pages += 1;
            for raw_line in page.text.lines() {
                let line = normalize_line(raw_line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                scan.stats.lines += 1;
                self.scan_line(&mut run, &mut scan, page.page, line);
            }
        }

        if !run.classifier.in_toc() {
            tracing::debug!("No contents marker seen; candidates came from leader layout only");
        }
        tracing::info!(
            "Scanned {} pages / {} lines: {} candidates, {} entries, {} rejected",
            scan.stats.pages,
            scan.stats.lines,
            scan.stats.candidates,
            scan.stats.matched,
            scan.stats.rejected
        );
        scan
    }

    fn scan_line(&self, run: &mut RunState, scan: &mut TocScan, page: u32, line: &str) {
        let kind = run.classifier.classify(line);
        *scan.stats.kinds.entry(kind.as_str()).or_insert(0) += 1;

        let mut trace = LineTrace {
            page,
            kind,
            pattern: None,
            rejection: None,
            section_id: None,
            text: line.to_string(),
        };

        if kind == LineKind::TocCandidate {
            scan.stats.candidates += 1;
            match self.matcher.match_line(line) {
                Ok(raw) => {
                    trace.pattern = Some(raw.pattern);
                    match self.build_entry(run, raw) {
                        Some(entry) => {
                            trace.section_id = Some(entry.section_id().to_string());
                            scan.stats.matched += 1;
                            scan.entries.push(entry);
                        }
                        None => scan.stats.rejected += 1,
                    }
                }
                Err(rejection) => {
                    // Most candidate lines are ordinary text; only count them.
                    if rejection != Rejection::NoPattern {
                        scan.stats.rejected += 1;
                        tracing::trace!("Rejected line '{}' on page {}: {}", line, page, rejection.as_str());
                    }
                    trace.rejection = Some(rejection);
                }
            }
        }

        if self.collect_trace {
            scan.trace.push(trace);
        }
    }

    fn build_entry(&self, run: &mut RunState, raw: RawEntry) -> Option<TocEntry> {
        let section_id = match raw.section_id {
            Some(id) => id,
            None => {
                run.synthetic_ids += 1;
                format!("S{}", run.synthetic_ids)
            }
        };

        match TocEntry::new(self.doc_title.as_str(), &section_id, &raw.title, raw.page) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Dropping matched line with section '{}': {}", section_id, e);
                None
            }
        }
    }
}

/// Keeps the first occurrence of every `(section_id, page)` pair, preserving order.
pub fn deduplicate(entries: Vec<TocEntry>) -> Vec<TocEntry> {
    let before = entries.len();
    let mut seen: HashSet<(String, u32)> = HashSet::with_capacity(entries.len());
    let unique: Vec<TocEntry> = entries
        .into_iter()
        .filter(|entry| {
            let (section_id, page) = entry.key();
            seen.insert((section_id.to_string(), page))
        })
        .collect();

    if unique.len() < before {
        tracing::debug!("Removed {} duplicate TOC lines", before - unique.len());
    }
    unique
}
