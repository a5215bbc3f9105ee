// src/extractors/hierarchy.rs
//! Nesting derived from dotted section identifiers.

/// Number of dot-separated segments: `"2.1.3"` is level 3.
pub fn level_of(section_id: &str) -> u32 {
    section_id.split('.').count() as u32
}

/// The identifier with its last segment removed, `None` for top-level ids.
pub fn parent_of(section_id: &str) -> Option<&str> {
    section_id.rsplit_once('.').map(|(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_of("1"), 1);
        assert_eq!(level_of("2.1"), 2);
        assert_eq!(level_of("2.1.3"), 3);
        assert_eq!(level_of("A.3"), 2);
        assert_eq!(level_of("S12"), 1);
    }

    #[test]
    fn test_parents() {
        assert_eq!(parent_of("1"), None);
        assert_eq!(parent_of("2.1"), Some("2"));
        assert_eq!(parent_of("2.1.3"), Some("2.1"));
        assert_eq!(parent_of("A.3"), Some("A"));
    }

    #[test]
    fn test_level_matches_dot_count() {
        for id in ["1", "1.2", "1.2.3", "10.4.1.7", "B.2.1"] {
            let dots = id.matches('.').count() as u32;
            assert_eq!(level_of(id), dots + 1, "level for {}", id);
            assert_eq!(parent_of(id).is_none(), dots == 0, "parent for {}", id);
        }
    }
}
