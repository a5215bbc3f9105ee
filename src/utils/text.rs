// src/utils/text.rs
use once_cell::sync::Lazy;
use regex::Regex;

static CONTROL_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("Failed to compile CONTROL_CHARS_RE"));

static HYPHEN_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-[ \t]*\n[ \t]*(\w)").expect("Failed to compile HYPHEN_BREAK_RE"));

static EXCESS_NEWLINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Failed to compile EXCESS_NEWLINES_RE"));

static SPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {2,}").expect("Failed to compile SPACE_RUN_RE"));

static TRAILING_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" +\n").expect("Failed to compile TRAILING_SPACE_RE"));

const REPLACEMENTS: [(char, &str); 8] = [
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
];

/// Normalizes a single extracted line without touching whitespace runs or tabs,
/// which the candidate filter relies on.
pub fn normalize_line(line: &str) -> String {
    let stripped = CONTROL_CHARS_RE.replace_all(line, "");
    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }
    out
}

/// Cleans paragraph content for output.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = normalize_line(text);
    let cleaned = HYPHEN_BREAK_RE.replace_all(&cleaned, "$1$2");
    let cleaned = EXCESS_NEWLINES_RE.replace_all(&cleaned, "\n\n");
    let cleaned = SPACE_RUN_RE.replace_all(&cleaned, " ");
    let cleaned = TRAILING_SPACE_RE.replace_all(&cleaned, "\n");
    cleaned.trim().to_string()
}
