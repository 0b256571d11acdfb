//! Point-index error type.

use thiserror::Error;

/// Errors produced by `sr-index`.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed point feed: {0}")]
    Malformed(String),
}

pub type IndexResult<T> = Result<T, IndexError>;
