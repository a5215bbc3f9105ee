// src/validation/mod.rs
//! Structural checks over a finished entry sequence.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::extractors::models::TocEntry;
use crate::utils::config::Limits;

/// Aggregate defect record. `validation_passed` is derived from the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub duplicates: Vec<String>,
    pub out_of_order: Vec<String>,
    pub missing_pages: Vec<u32>,
    pub duplicate_pages: Vec<u32>,
    pub total_entries: usize,
    pub validation_passed: bool,
}

impl ValidationReport {
    pub fn defect_count(&self) -> usize {
        self.duplicates.len() + self.out_of_order.len() + self.missing_pages.len() + self.duplicate_pages.len()
    }
}

pub struct Validator;

impl Validator {
    /// Runs every check independently. `content_pages` enables the missing-page check.
    pub fn validate(entries: &[TocEntry], content_pages: Option<&BTreeSet<u32>>) -> ValidationReport {
        let mut report = ValidationReport {
            total_entries: entries.len(),
            ..ValidationReport::default()
        };

        if !entries.is_empty() {
            report.duplicates = Self::check_duplicates(entries);
            report.out_of_order = Self::check_order(entries);
            report.duplicate_pages = Self::check_duplicate_pages(entries);
            if let Some(pages) = content_pages {
                report.missing_pages = Self::check_missing_pages(entries, pages);
            }
        }

        report.validation_passed = report.defect_count() == 0;
        if report.validation_passed {
            tracing::info!("TOC validation passed for {} entries", report.total_entries);
        } else {
            tracing::warn!(
                "TOC validation found {} duplicate ids, {} out-of-order entries, {} duplicate pages, {} missing pages",
                report.duplicates.len(),
                report.out_of_order.len(),
                report.duplicate_pages.len(),
                report.missing_pages.len()
            );
        }
        report
    }

    // Every repeat is recorded, so an id seen three times appears twice.
    fn check_duplicates(entries: &[TocEntry]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        entries
            .iter()
            .map(TocEntry::section_id)
            .filter(|id| !seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    // The high-water mark only advances on non-decreasing pages, so one dip
    // flags just the entries below the mark.
    fn check_order(entries: &[TocEntry]) -> Vec<String> {
        let mut out_of_order = Vec::new();
        let mut last_page = 0;
        for entry in entries {
            if entry.page() < last_page {
                out_of_order.push(entry.section_id().to_string());
            } else {
                last_page = entry.page();
            }
        }
        out_of_order
    }

    // Pages in first-seen order.
    fn check_duplicate_pages(entries: &[TocEntry]) -> Vec<u32> {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        let mut order = Vec::new();
        for entry in entries {
            let count = counts.entry(entry.page()).or_insert(0);
            if *count == 0 {
                order.push(entry.page());
            }
            *count += 1;
        }
        order.into_iter().filter(|page| counts[page] > 1).collect()
    }

    fn check_missing_pages(entries: &[TocEntry], content_pages: &BTreeSet<u32>) -> Vec<u32> {
        let Some(&max_content_page) = content_pages.iter().next_back() else {
            return Vec::new();
        };
        entries
            .iter()
            .map(TocEntry::page)
            .filter(|page| *page <= max_content_page && !content_pages.contains(page))
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect()
    }
}

/// Strict pass: yields only entries with a plausible page and an unseen id.
///
/// Rejections are logged and dropped, never returned as errors. The caller
/// reads [`StrictEntries::dropped`] once the iterator is drained.
pub fn validate_iter<I>(entries: I, limits: &Limits) -> StrictEntries<I::IntoIter>
where
    I: IntoIterator<Item = TocEntry>,
{
    StrictEntries {
        inner: entries.into_iter(),
        max_page: limits.strict_max_page,
        year_floor: limits.year_guard_floor,
        seen_ids: HashSet::new(),
        dropped: 0,
    }
}

pub struct StrictEntries<I> {
    inner: I,
    max_page: u32,
    year_floor: u32,
    seen_ids: HashSet<String>,
    dropped: usize,
}

impl<I> StrictEntries<I> {
    /// Entries rejected so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn accept(&mut self, entry: &TocEntry) -> bool {
        let page = entry.page();
        if page == 0 || page > self.max_page {
            tracing::warn!("Invalid page number {} for section {} '{}'", page, entry.section_id(), entry.title());
            return false;
        }
        if looks_like_year(page, self.year_floor) {
            tracing::warn!(
                "Suspicious page number {} (looks like year) for section {} '{}'",
                page,
                entry.section_id(),
                entry.title()
            );
            return false;
        }
        if !self.seen_ids.insert(entry.section_id().to_string()) {
            tracing::warn!("Duplicate section ID: {}", entry.section_id());
            return false;
        }
        true
    }
}

impl<I: Iterator<Item = TocEntry>> Iterator for StrictEntries<I> {
    type Item = TocEntry;

    fn next(&mut self) -> Option<TocEntry> {
        while let Some(entry) = self.inner.next() {
            if self.accept(&entry) {
                return Some(entry);
            }
            self.dropped += 1;
        }
        None
    }
}

fn looks_like_year(page: u32, floor: u32) -> bool {
    if page <= floor {
        return false;
    }
    let digits = page.to_string();
    digits.starts_with("19") || digits.starts_with("20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, page: u32) -> TocEntry {
        TocEntry::new("Doc", id, "Some Title", page).unwrap()
    }

    #[test]
    fn test_clean_sequence_passes() {
        let entries = vec![entry("1", 5), entry("1.1", 6), entry("2", 9), entry("2.1", 12)];
        let report = Validator::validate(&entries, None);
        assert!(report.validation_passed);
        assert_eq!(report.total_entries, 4);
        assert_eq!(report.defect_count(), 0);
    }

    #[test]
    fn test_out_of_order_flags_only_the_dip() {
        let entries = vec![entry("1", 10), entry("2", 30), entry("3", 20)];
        let report = Validator::validate(&entries, None);
        assert_eq!(report.out_of_order, vec!["3".to_string()]);
        assert!(!report.validation_passed);

        let entries = vec![entry("1", 10), entry("2", 30), entry("3", 20), entry("4", 31), entry("5", 40)];
        assert_eq!(Validator::validate(&entries, None).out_of_order, vec!["3".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_and_pages() {
        let entries = vec![entry("1", 5), entry("1", 5), entry("2", 7), entry("1", 8), entry("3", 7)];
        let report = Validator::validate(&entries, None);
        assert_eq!(report.duplicates, vec!["1".to_string(), "1".to_string()]);
        assert_eq!(report.duplicate_pages, vec![5, 7]);
        // page 7 after the high-water mark of 8
        assert_eq!(report.out_of_order, vec!["3".to_string()]);
        assert!(!report.validation_passed);
    }

    #[test]
    fn test_every_repeat_of_an_id_is_recorded() {
        let entries = vec![entry("1", 3), entry("1", 4), entry("1", 5), entry("2", 6), entry("2", 7)];
        let report = Validator::validate(&entries, None);
        assert_eq!(report.duplicates, vec!["1", "1", "2"]);
        assert!(report.out_of_order.is_empty());
        assert!(report.duplicate_pages.is_empty());
    }

    #[test]
    fn test_missing_pages_against_content() {
        let entries = vec![entry("1", 2), entry("2", 4), entry("3", 6), entry("4", 90)];
        let content: BTreeSet<u32> = [1, 2, 3, 5, 6, 7].into_iter().collect();
        let report = Validator::validate(&entries, Some(&content));
        // page 90 lies beyond the content stream and is not reported
        assert_eq!(report.missing_pages, vec![4]);
        assert!(!report.validation_passed);

        let report = Validator::validate(&entries, Some(&BTreeSet::new()));
        assert!(report.missing_pages.is_empty());
    }

    #[test]
    fn test_empty_sequence() {
        let report = Validator::validate(&[], None);
        assert!(report.validation_passed);
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn test_report_schema() {
        let report = Validator::validate(&[entry("1", 3)], None);
        let json = serde_json::to_value(&report).unwrap();
        for key in ["duplicates", "out_of_order", "missing_pages", "duplicate_pages", "total_entries", "validation_passed"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_strict_pass_rejects_years_and_ceiling() {
        let entries = vec![entry("1", 12), entry("2", 2012), entry("3", 1600), entry("4", 40)];
        let mut strict = validate_iter(entries, &Limits::default());
        let kept: Vec<String> = strict.by_ref().map(|e| e.section_id().to_string()).collect();
        assert_eq!(kept, vec!["1", "4"]);
        assert_eq!(strict.dropped(), 2);
        assert_eq!(strict.next(), None);
        assert_eq!(strict.dropped(), 2);
    }

    #[test]
    fn test_year_guard_independent_of_ceiling() {
        let limits = Limits { strict_max_page: 5000, ..Limits::default() };
        let entries = vec![entry("1", 1998), entry("2", 2012), entry("3", 1200), entry("4", 3100)];
        let kept: Vec<u32> = validate_iter(entries, &limits).map(|e| e.page()).collect();
        assert_eq!(kept, vec![1200, 3100]);
    }

    #[test]
    fn test_strict_pass_drops_repeated_ids() {
        let entries = vec![entry("1", 3), entry("2", 4), entry("1", 9)];
        let kept: Vec<(String, u32)> = validate_iter(entries, &Limits::default())
            .map(|e| (e.section_id().to_string(), e.page()))
            .collect();
        assert_eq!(kept, vec![("1".to_string(), 3), ("2".to_string(), 4)]);
    }
}
