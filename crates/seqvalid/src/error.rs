//! Error types for the validator.
//!
//! These are failures of the validator itself (a table that fails to load, a
//! service that cannot be reached, a record that breaks a schema invariant).
//! Problems with the record's content are reported as findings instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for validator operations.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library while loading a lookup table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// HTTP transport failure talking to a remote service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A service answered, but not with anything usable.
    #[error("Service error: {0}")]
    Service(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A field the schema guarantees was absent.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Data that violates a schema invariant.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An error code string that names no known code.
    #[error("Unknown error code: {0}")]
    UnknownErrorCode(String),
}

/// Result type alias for validator operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;
