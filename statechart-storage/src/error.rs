//! Storage error types.

use statechart_core::ModelError;
use thiserror::Error;

/// Errors from loading or writing model documents.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl StorageError {
    /// Returns true if the document could not be understood.
    pub fn is_parse_error(&self) -> bool {
        match self {
            StorageError::Json(_) => true,
            StorageError::Model(e) => e.error_code() == "PARSE_ERROR",
            StorageError::Io(_) => false,
        }
    }

    /// Returns true if the document declares an unsupported format version.
    pub fn is_version_error(&self) -> bool {
        matches!(self, StorageError::Model(ModelError::UnsupportedVersion { .. }))
    }

    /// Returns a stable error code suitable for tool output.
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "IO_ERROR",
            StorageError::Json(_) => "PARSE_ERROR",
            StorageError::Model(e) => e.error_code(),
        }
    }
}
