//! mintscan token feed ingester.
//!
//! Orchestrates:
//! - the feed connection (subscribe, receive, reconnect)
//! - classification of inbound frames
//! - the local CSV ledger and the remote token table

pub mod app;
pub mod config;
pub mod error;
pub mod ingest;

pub use app::Application;
pub use config::{AppConfig, StoreCredentials};
pub use error::{AppError, AppResult};
pub use ingest::{IngestOutcome, IngestStats, Ingestor, SinkOutcome, SkipReason};
