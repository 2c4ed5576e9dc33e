//! Ingestion coordinator.
//!
//! Turns each inbound frame into at most one token record and offers it to
//! both sinks. Each sink checks membership on its own and failures in one
//! never block the other or later frames.

use mintscan_core::{classify, decode_frame, is_signed, signature_preview, TokenRecord};
use mintscan_persistence::{AppendOutcome, CsvLedger};
use mintscan_store::DynRemoteStore;
use mintscan_telemetry::Metrics;
use mintscan_ws::{BoxFuture, FrameHandler};
use tracing::{debug, error, info, warn};

const LEDGER_SINK: &str = "ledger";
const REMOTE_SINK: &str = "remote";

/// Why a frame produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not valid JSON.
    Decode,
    /// No `signature` field.
    Unsigned,
    /// Signed, but no non-empty address field.
    NoAddress,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode => "decode_error",
            Self::Unsigned => "unsigned",
            Self::NoAddress => "no_address",
        }
    }
}

/// Per-sink result for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Written,
    Duplicate,
    Failed,
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Skipped(SkipReason),
    Recorded {
        record: TokenRecord,
        ledger: SinkOutcome,
        remote: SinkOutcome,
    },
}

impl IngestOutcome {
    /// Whether either sink gained a new record.
    pub fn is_new(&self) -> bool {
        match self {
            Self::Skipped(_) => false,
            Self::Recorded { ledger, remote, .. } => {
                *ledger == SinkOutcome::Written || *remote == SinkOutcome::Written
            }
        }
    }
}

/// Running counters, logged at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub frames: u64,
    pub skipped_decode: u64,
    pub skipped_unsigned: u64,
    pub skipped_no_address: u64,
    pub ledger_written: u64,
    pub ledger_duplicates: u64,
    pub ledger_failures: u64,
    pub remote_written: u64,
    pub remote_duplicates: u64,
    pub remote_failures: u64,
    pub observations: u64,
}

impl IngestStats {
    fn record(&mut self, outcome: &IngestOutcome) {
        self.frames += 1;
        match outcome {
            IngestOutcome::Skipped(SkipReason::Decode) => self.skipped_decode += 1,
            IngestOutcome::Skipped(SkipReason::Unsigned) => self.skipped_unsigned += 1,
            IngestOutcome::Skipped(SkipReason::NoAddress) => self.skipped_no_address += 1,
            IngestOutcome::Recorded { ledger, remote, .. } => {
                match ledger {
                    SinkOutcome::Written => self.ledger_written += 1,
                    SinkOutcome::Duplicate => self.ledger_duplicates += 1,
                    SinkOutcome::Failed => self.ledger_failures += 1,
                }
                match remote {
                    SinkOutcome::Written => self.remote_written += 1,
                    SinkOutcome::Duplicate => self.remote_duplicates += 1,
                    SinkOutcome::Failed => self.remote_failures += 1,
                }
                if outcome.is_new() {
                    self.observations += 1;
                }
            }
        }
    }

    /// Log the counters as one summary line.
    pub fn log_summary(&self) {
        info!(
            frames = self.frames,
            skipped_decode = self.skipped_decode,
            skipped_unsigned = self.skipped_unsigned,
            skipped_no_address = self.skipped_no_address,
            ledger_written = self.ledger_written,
            ledger_duplicates = self.ledger_duplicates,
            ledger_failures = self.ledger_failures,
            remote_written = self.remote_written,
            remote_duplicates = self.remote_duplicates,
            remote_failures = self.remote_failures,
            observations = self.observations,
            "Ingestion summary"
        );
    }
}

/// Sequential frame processor owning both sinks.
pub struct Ingestor {
    ledger: CsvLedger,
    store: DynRemoteStore,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(ledger: CsvLedger, store: DynRemoteStore) -> Self {
        Self {
            ledger,
            store,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Process one text frame to completion.
    pub async fn process_frame(&mut self, text: &str) -> IngestOutcome {
        let outcome = self.ingest(text).await;
        self.stats.record(&outcome);

        match &outcome {
            IngestOutcome::Skipped(reason) => Metrics::frame_skipped(reason.as_str()),
            IngestOutcome::Recorded {
                record,
                ledger,
                remote,
            } if outcome.is_new() => {
                info!(
                    address = %record.address,
                    name = %record.name,
                    symbol = %record.symbol,
                    observed_at = %record.timestamp_string(),
                    ledger = ?ledger,
                    remote = ?remote,
                    "New token recorded"
                );
            }
            IngestOutcome::Recorded { record, .. } => {
                debug!(address = %record.address, "Token already known");
            }
        }

        outcome
    }

    async fn ingest(&mut self, text: &str) -> IngestOutcome {
        let payload = match decode_frame(text) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable frame");
                return IngestOutcome::Skipped(SkipReason::Decode);
            }
        };

        if !is_signed(&payload) {
            return IngestOutcome::Skipped(SkipReason::Unsigned);
        }
        debug!(signature = %signature_preview(&payload), "Signed frame received");

        let Some(fields) = classify(&payload) else {
            return IngestOutcome::Skipped(SkipReason::NoAddress);
        };

        let record = fields.observe();
        let ledger = self.write_ledger(&record);
        let remote = self.write_remote(&record).await;

        IngestOutcome::Recorded {
            record,
            ledger,
            remote,
        }
    }

    fn write_ledger(&mut self, record: &TokenRecord) -> SinkOutcome {
        match self.ledger.append(record) {
            Ok(AppendOutcome::Appended) => {
                Metrics::record_written(LEDGER_SINK);
                SinkOutcome::Written
            }
            Ok(AppendOutcome::Duplicate) => {
                Metrics::record_duplicate(LEDGER_SINK);
                SinkOutcome::Duplicate
            }
            Err(e) => {
                error!(
                    address = %record.address,
                    path = %self.ledger.path().display(),
                    error = %e,
                    "Ledger write failed"
                );
                Metrics::sink_failed(LEDGER_SINK);
                SinkOutcome::Failed
            }
        }
    }

    async fn write_remote(&self, record: &TokenRecord) -> SinkOutcome {
        match self.store.exists(&record.address).await {
            Ok(true) => {
                Metrics::record_duplicate(REMOTE_SINK);
                return SinkOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                error!(address = %record.address, error = %e, "Remote lookup failed");
                Metrics::sink_failed(REMOTE_SINK);
                return SinkOutcome::Failed;
            }
        }

        match self.store.insert(record).await {
            Ok(()) => {
                Metrics::record_written(REMOTE_SINK);
                SinkOutcome::Written
            }
            Err(e) if e.is_conflict() => {
                warn!(address = %record.address, error = %e, "Remote row already exists");
                Metrics::record_duplicate(REMOTE_SINK);
                SinkOutcome::Duplicate
            }
            Err(e) => {
                error!(address = %record.address, error = %e, "Remote insert failed");
                Metrics::sink_failed(REMOTE_SINK);
                SinkOutcome::Failed
            }
        }
    }
}

impl FrameHandler for Ingestor {
    fn handle_frame<'a>(&'a mut self, frame: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.process_frame(frame).await;
        })
    }
}
