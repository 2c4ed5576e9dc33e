//! Prometheus metrics and structured logging for mintscan.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for the feed lifecycle and both sinks
//! - Optional `/metrics` HTTP exporter

pub mod error;
pub mod exporter;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use exporter::{render_metrics, serve_metrics};
pub use logging::init_logging;
pub use metrics::Metrics;
