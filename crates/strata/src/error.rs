//! Error types for the strata library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Caller-supplied data violates a precondition.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The record view could not be obtained from the raw text.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid delimiter detected or specified.
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// Empty input or no data to profile.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A worker-pool operation exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A chunk of parallel work failed.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Cache read/write failure. Best-effort: callers convert to miss.
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
