//! Error types for mintscan-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Frame decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
