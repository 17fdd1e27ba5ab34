//! Error types for ecosteer_io.
//!
//! Covers serialization, save-file validation and file-system failures.

use thiserror::Error;

/// Main error type for ecosteer_io operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Rkyv-specific errors
    #[error("Rkyv error: {0}")]
    Rkyv(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record or save file written by a newer format
    #[error("Unsupported format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Stored checksum does not match the payload
    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result type alias for ecosteer_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    #[must_use]
    pub fn rkyv<S: Into<String>>(msg: S) -> Self {
        Self::Rkyv(msg.into())
    }

    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IoError::serialization("test error");
        assert_eq!(err.to_string(), "Serialization error: test error");
    }

    #[test]
    fn test_error_context() {
        let err = IoError::validation("bad dominance record").with_context("loading components");
        assert!(err.to_string().contains("loading components"));
        assert!(err.to_string().contains("bad dominance record"));
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = IoError::UnsupportedVersion {
            found: 9,
            supported: 1,
        };
        assert!(err.to_string().contains("version 9"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IoError = io_err.into();
        assert!(matches!(err, IoError::FileSystem(_)));
    }
}
