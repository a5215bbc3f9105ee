// src/utils/debug.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::extractors::toc::LineTrace;
use crate::utils::error::AppError;

/// Renders a scan trace as one annotated line per input line.
///
/// Columns: page, line kind, outcome, text. Outcome is the matched pattern
/// and resulting section id, the rejection reason, or `-`.
pub fn render_trace(trace: &[LineTrace]) -> String {
    let mut out = String::from("# page\tkind\toutcome\ttext\n");

    for line in trace {
        let outcome = match (&line.pattern, &line.section_id, &line.rejection) {
            (Some(pattern), Some(id), _) => format!("{} -> {}", pattern.as_str(), id),
            (Some(pattern), None, _) => format!("{} -> dropped", pattern.as_str()),
            (None, _, Some(rejection)) => format!("rejected: {}", rejection.as_str()),
            _ => "-".to_string(),
        };
        out.push_str(&format!("{}\t{}\t{}\t{}\n", line.page, line.kind.as_str(), outcome, line.text));
    }

    out
}

/// Saves the annotated trace of a TOC scan.
pub fn save_debug_trace(trace: &[LineTrace], filename: &Path) -> Result<(), AppError> {
    let mut file = File::create(filename)?;
    file.write_all(render_trace(trace).as_bytes())?;

    tracing::info!("Saved debug trace ({} lines) to {}", trace.len(), filename.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::toc::TocExtractor;
    use crate::source::models::PageText;
    use crate::utils::config::Limits;

    #[test]
    fn test_trace_rendering() {
        let pages = vec![PageText {
            page: 3,
            text: "Contents\n1 Introduction ........ 5\n1 A  15\nPlain prose without numbers".to_string(),
        }];
        let scan = TocExtractor::new("Doc", &Limits::default()).with_trace(true).extract(&pages);
        let rendered = render_trace(&scan.trace);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "3\ttoc_marker\t-\tContents");
        assert_eq!(lines[2], "3\ttoc_candidate\tdotted_leader -> 1\t1 Introduction ........ 5");
        assert_eq!(lines[3], "3\ttoc_candidate\trejected: short_title\t1 A  15");
    }

    #[test]
    fn test_save_debug_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toc_trace.txt");
        save_debug_trace(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# page\tkind\toutcome\ttext\n");
    }
}
