// src/extractors/line.rs
//! Per-line classification and the TOC candidate filter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// --- Regex Patterns (Lazy Static) ---

// "Contents" / "Table of Contents", optionally followed by a leader and page.
static TOC_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:table\s+of\s+)?contents\s*(?:[.\s]*\d{1,4})?\s*$")
        .expect("Failed to compile TOC_MARKER_RE")
});

// "5 July 2012", "31 Oct 2012"
static DATE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*\d{1,2}\s+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?\s+\d{4}\s*$",
    )
    .expect("Failed to compile DATE_LINE_RE")
});

// "Figure 5 ...", "Table 3-2 ...", "Fig. A.1 ..."
static CAPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:figure|fig\.|table)\s+(?:[a-z]+[.\-])?\d+")
        .expect("Failed to compile CAPTION_RE")
});

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)*|[A-Z](?:\.\d+)+)\.?\s+[A-Z][^.]{2,}$")
        .expect("Failed to compile HEADING_RE")
});

static REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:shall|must)\b").expect("Failed to compile REQUIREMENT_RE")
});

static DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][^:]{0,48}:\s+\S").expect("Failed to compile DEFINITION_RE")
});

const MAX_HEADING_LEN: usize = 100;

/// What a single line of page text looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Short,
    TocMarker,
    Date,
    Caption,
    TocCandidate,
    Heading,
    Requirement,
    Definition,
    Prose,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Short => "short",
            LineKind::TocMarker => "toc_marker",
            LineKind::Date => "date",
            LineKind::Caption => "caption",
            LineKind::TocCandidate => "toc_candidate",
            LineKind::Heading => "heading",
            LineKind::Requirement => "requirement",
            LineKind::Definition => "definition",
            LineKind::Prose => "prose",
        }
    }
}

/// Classifies lines of one extraction run.
///
/// Carries the "in TOC section" flag, which is set by the first marker line and
/// stays set for the rest of the run (it is deliberately not reset per page).
/// Create one classifier per run; never share it between runs.
#[derive(Debug)]
pub struct LineClassifier {
    min_line_len: usize,
    in_toc: bool,
}

impl LineClassifier {
    pub fn new(min_line_len: usize) -> Self {
        Self { min_line_len, in_toc: false }
    }

    pub fn in_toc(&self) -> bool {
        self.in_toc
    }

    /// Classifies a trimmed line. Rule order is significant.
    pub fn classify(&mut self, line: &str) -> LineKind {
        if line.chars().count() < self.min_line_len {
            return LineKind::Short;
        }
        if TOC_MARKER_RE.is_match(line) {
            if !self.in_toc {
                tracing::debug!("Entered TOC section at marker '{}'", line);
            }
            self.in_toc = true;
            return LineKind::TocMarker;
        }
        if DATE_LINE_RE.is_match(line) {
            return LineKind::Date;
        }
        if CAPTION_RE.is_match(line) {
            return LineKind::Caption;
        }
        if self.in_toc || has_leader_layout(line) {
            return LineKind::TocCandidate;
        }
        if line.chars().count() <= MAX_HEADING_LEN && HEADING_RE.is_match(line) {
            return LineKind::Heading;
        }
        if REQUIREMENT_RE.is_match(line) {
            return LineKind::Requirement;
        }
        if DEFINITION_RE.is_match(line) {
            return LineKind::Definition;
        }
        LineKind::Prose
    }
}

/// Dotted or tab leader, or column-aligned spacing, independent of any marker.
fn has_leader_layout(line: &str) -> bool {
    line.contains("...") || line.contains("  ") || line.contains("\t\t")
}
