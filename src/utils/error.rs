// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("I/O error while reading pages: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error("Page worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Empty section_id")]
    EmptySectionId,

    #[error("Invalid section_id format: {0}")]
    InvalidSectionId(String),

    #[error("Page must be positive for section {0}")]
    InvalidPage(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Page extraction failed: {0}")]
    Source(#[from] SourceError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::Timeout(30);
        assert_eq!(err.to_string(), "Page extraction timed out after 30 seconds");

        let err = StorageError::MalformedRecord { line: 4, reason: "bad".to_string() };
        assert_eq!(err.to_string(), "Malformed record at line 4: bad");
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = ExtractError::EmptySectionId.into();
        assert!(matches!(err, AppError::Extraction(ExtractError::EmptySectionId)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = SourceError::from(io_err).into();
        assert!(matches!(err, AppError::Source(SourceError::Io(_))));
    }
}
