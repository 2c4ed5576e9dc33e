//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "Table '{table}' does not exist.\n\
         Create it in the SQL editor with:\n\n{schema_sql}\n\
         Then restart mintscan."
    )]
    MissingTable { table: String, schema_sql: String },

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unique constraint conflict: {0}")]
    Conflict(String),

    #[error("Response decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether the error reports a row that already exists remotely.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
