// src/extractors/mod.rs
pub mod content;
pub mod hierarchy;
pub mod line;
pub mod models;
pub mod patterns;
pub mod toc;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use content::{derive_blocks, ContentClassifier, ContentCounts, ContentExtractor};
#[allow(unused_imports)]
pub use models::{ContentItem, ContentType, TocEntry};
#[allow(unused_imports)]
pub use toc::{deduplicate, TocExtractor, TocScan};
