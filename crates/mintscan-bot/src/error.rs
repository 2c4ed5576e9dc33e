//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Missing remote store credentials (SUPABASE_URL: {url}, SUPABASE_KEY: {key}). \
         Set both in the environment or in a .env file."
    )]
    MissingCredentials { url: &'static str, key: &'static str },

    #[error("Store error: {0}")]
    Store(#[from] mintscan_store::StoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mintscan_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
