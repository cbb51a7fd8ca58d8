//! Error types for the l2 experience logger.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for logger and aggregation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the write and read paths.
///
/// Write-path variants are raised synchronously by the failing call and are
/// never retried: they describe programmer or data errors, not transient
/// conditions.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Record validation errors (20-29)
    #[error("record schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("{field} must be non-decreasing: got {value} after {last}")]
    OrderingViolation {
        field: &'static str,
        last: u64,
        value: u64,
    },

    #[error("{field} must be one of {allowed:?}, got {value:?}")]
    InvalidEnum {
        field: String,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("invalid {field}: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("invalid task_params: {0}")]
    InvalidTaskParams(String),

    // Read path errors (30-39)
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("log validation failed with {count} violation(s): {summary}")]
    BatchValidation { count: usize, summary: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("delimited file error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidConfiguration(_) => 10,
            Error::SchemaMismatch(_) => 20,
            Error::OrderingViolation { .. } => 21,
            Error::InvalidEnum { .. } => 22,
            Error::InvalidFormat { .. } => 23,
            Error::InvalidTaskParams(_) => 24,
            Error::NotFound { .. } => 30,
            Error::BatchValidation { .. } => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Csv(_) => 62,
        }
    }

    /// Convenience constructor for a missing file or directory.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }
}
