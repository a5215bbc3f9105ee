// src/utils/config.rs
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::utils::error::AppError;

const DEFAULT_DOC_TITLE: &str = "USB Power Delivery Specification";

/// Thresholds shared by the line classifier, the entry matcher and the validator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Lines shorter than this (in characters, after trimming) are never TOC lines.
    pub min_line_len: usize,
    /// Minimum title length after leader stripping.
    pub min_title_len: usize,
    /// Plausibility ceiling applied while matching lines.
    pub matcher_max_page: u32,
    /// Ceiling applied by the strict validation pass.
    pub strict_max_page: u32,
    /// Pages above this that start with "19"/"20" are treated as years.
    pub year_guard_floor: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_line_len: 5,
            min_title_len: 3,
            matcher_max_page: 2000,
            strict_max_page: 1500,
            year_guard_floor: 999,
        }
    }
}

/// Run configuration, loaded from `application.yml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub blocks_path: Option<PathBuf>,
    pub output_directory: PathBuf,
    pub doc_title: String,
    pub max_pages: Option<usize>,
    pub toc_scan_pages: Option<usize>,
    pub workers: usize,
    pub extraction_timeout_secs: u64,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("assets/pages"),
            blocks_path: None,
            output_directory: PathBuf::from("outputs"),
            doc_title: DEFAULT_DOC_TITLE.to_string(),
            max_pages: None,
            toc_scan_pages: Some(20),
            workers: 4,
            extraction_timeout_secs: 300,
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Loads the configuration file, falling back to defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read config file {}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, AppError> {
        // An empty document deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.workers == 0 {
            return Err(AppError::Config("workers must be at least 1".to_string()));
        }
        if self.extraction_timeout_secs == 0 {
            return Err(AppError::Config("extraction_timeout_secs must be positive".to_string()));
        }
        if self.limits.min_title_len == 0 {
            return Err(AppError::Config("limits.min_title_len must be positive".to_string()));
        }
        if self.limits.strict_max_page == 0 || self.limits.matcher_max_page == 0 {
            return Err(AppError::Config("page ceilings must be positive".to_string()));
        }
        if self.doc_title.trim().is_empty() {
            return Err(AppError::Config("doc_title must not be empty".to_string()));
        }
        Ok(())
    }
}
