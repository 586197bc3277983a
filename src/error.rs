// src/error.rs
//! Application error types with structured error handling.
//!
//! Network-layer conditions never surface here — the fetch controller
//! classifies them into `PageOutcome` values and returns partial results.
//! The variants below cover the fail-fast surface (caller input, export IO)
//! and internal plumbing.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid date filter '{input}': expected YYYY-MM-DD")]
    InvalidDateFilter { input: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    CsvExport(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
