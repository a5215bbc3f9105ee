// src/extractors/patterns.rs
//! The entry pattern cascade: `(section_id, title, page)` from one TOC line.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::utils::config::Limits;

// --- Regex Patterns (Lazy Static) ---

// Numbered ids ("2", "2.1.3") or appendix ids that carry at least one dot ("A.3").
const SECTION_ID: &str = r"(\d+(?:\.\d+)*|[A-Z](?:\.\d+)+)";

// 2+ dots or tabs, optionally spaced (". . . .").
const LEADER: &str = r"(?:[.\t][ \t]*){2,}";

static DOTTED_LEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{SECTION_ID}\.?\s+(.+?)\s*{LEADER}(\d{{1,4}})\s*$"))
        .expect("Failed to compile DOTTED_LEADER_RE")
});

static SPACED_COLUMNS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{SECTION_ID}\.?\s+(.+?)\s{{2,}}(\d{{1,4}})\s*$"))
        .expect("Failed to compile SPACED_COLUMNS_RE")
});

static UNNUMBERED_LEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Z][^.]*?)\s*(?:\.[ \t]*){2,}(\d{1,4})\s*$")
        .expect("Failed to compile UNNUMBERED_LEADER_RE")
});

static LEADER_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}|-{2,}").expect("Failed to compile LEADER_RUN_RE"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

/// The closed set of line shapes, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPattern {
    /// `2.1 Title ........ 34`
    DottedLeader,
    /// `2.1 Title     34`
    SpacedColumns,
    /// `Revision History ........ 3` (gets a synthetic `S<n>` id)
    UnnumberedLeader,
}

impl EntryPattern {
    /// Most specific first. The first pattern that matches decides the line.
    pub const PRIORITY: [EntryPattern; 3] = [
        EntryPattern::DottedLeader,
        EntryPattern::SpacedColumns,
        EntryPattern::UnnumberedLeader,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            EntryPattern::DottedLeader => &*DOTTED_LEADER_RE,
            EntryPattern::SpacedColumns => &*SPACED_COLUMNS_RE,
            EntryPattern::UnnumberedLeader => &*UNNUMBERED_LEADER_RE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPattern::DottedLeader => "dotted_leader",
            EntryPattern::SpacedColumns => "spaced_columns",
            EntryPattern::UnnumberedLeader => "unnumbered_leader",
        }
    }

    fn split<'l>(&self, caps: &Captures<'l>) -> Option<(Option<&'l str>, &'l str, &'l str)> {
        match self {
            EntryPattern::DottedLeader | EntryPattern::SpacedColumns => Some((
                Some(caps.get(1)?.as_str()),
                caps.get(2)?.as_str(),
                caps.get(3)?.as_str(),
            )),
            EntryPattern::UnnumberedLeader => {
                Some((None, caps.get(1)?.as_str(), caps.get(2)?.as_str()))
            }
        }
    }
}

/// Fields pulled out of a line. `section_id` is `None` for un-numbered headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub pattern: EntryPattern,
    pub section_id: Option<String>,
    pub title: String,
    pub page: u32,
}

/// Why a line that reached the matcher produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooShort,
    NoPattern,
    BadPage,
    PageCeiling,
    ShortTitle,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::TooShort => "too_short",
            Rejection::NoPattern => "no_pattern",
            Rejection::BadPage => "bad_page",
            Rejection::PageCeiling => "page_ceiling",
            Rejection::ShortTitle => "short_title",
        }
    }
}

/// Stateless cascade over [`EntryPattern::PRIORITY`].
#[derive(Debug, Clone)]
pub struct EntryMatcher {
    min_line_len: usize,
    min_title_len: usize,
    max_page: u32,
}

impl EntryMatcher {
    pub fn new(limits: &Limits) -> Self {
        Self {
            min_line_len: limits.min_line_len,
            min_title_len: limits.min_title_len,
            max_page: limits.matcher_max_page,
        }
    }

    /// Tries each pattern in priority order; a plausibility failure after a
    /// pattern matched rejects the line without consulting later patterns.
    pub fn match_line(&self, line: &str) -> Result<RawEntry, Rejection> {
        let line = line.trim();
        if line.chars().count() < self.min_line_len {
            return Err(Rejection::TooShort);
        }

        for pattern in EntryPattern::PRIORITY {
            let Some(caps) = pattern.regex().captures(line) else {
                continue;
            };
            let (section_id, title, page_str) = pattern.split(&caps).ok_or(Rejection::NoPattern)?;
            tracing::trace!("Line '{}' matched {}", line, pattern.as_str());
            return self.build(pattern, section_id, title, page_str);
        }

        Err(Rejection::NoPattern)
    }

    fn build(
        &self,
        pattern: EntryPattern,
        section_id: Option<&str>,
        title: &str,
        page_str: &str,
    ) -> Result<RawEntry, Rejection> {
        let page: u32 = page_str.parse().map_err(|_| Rejection::BadPage)?;
        if page == 0 {
            return Err(Rejection::BadPage);
        }
        if page > self.max_page {
            return Err(Rejection::PageCeiling);
        }

        let title = clean_title(title);
        if title.chars().count() < self.min_title_len {
            return Err(Rejection::ShortTitle);
        }

        Ok(RawEntry {
            pattern,
            section_id: section_id.map(str::to_string),
            title,
            page,
        })
    }
}

/// Strips leader runs, collapses whitespace and trims trailing dots.
pub fn clean_title(raw: &str) -> String {
    let without_leaders = LEADER_RUN_RE.replace_all(raw, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_leaders, " ");
    collapsed
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '-' || c.is_whitespace())
        .to_string()
}
