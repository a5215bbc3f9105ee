// src/source/mod.rs
//! Input side: page text and content blocks from the extraction collaborator.
pub mod loader;
pub mod models;

pub use loader::{load_blocks, PageLoader};
