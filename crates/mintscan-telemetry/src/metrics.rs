//! Prometheus metrics for mintscan.
//!
//! Covers:
//! - Feed connection state and reconnects
//! - Frame intake and skip reasons
//! - Per-sink writes, duplicates and failures
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error caught on first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_int_counter, CounterVec,
    Gauge, GaugeVec, IntCounter,
};

/// Feed connection state (1 = socket open, 0 = not open).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("mintscan_ws_connected", "Feed socket state (1=open)").unwrap()
});

/// Feed state machine current state.
/// Labels: state (disconnected/connecting/subscribed/receiving)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mintscan_ws_state",
        "Feed state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Total feed reconnects.
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_ws_reconnect_total",
        "Total feed reconnects",
        &["reason"]
    )
    .unwrap()
});

/// Subscription intents sent.
pub static SUBSCRIPTIONS_SENT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_subscriptions_sent_total",
        "Subscription intents sent to the feed",
        &["method"]
    )
    .unwrap()
});

/// Frames handed to the ingester.
pub static FRAMES_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mintscan_frames_received_total",
        "Frames received from the feed"
    )
    .unwrap()
});

/// Frames dropped before reaching any sink.
/// Labels: reason (non_utf8/decode_error/unsigned/no_address)
pub static FRAMES_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_frames_skipped_total",
        "Frames skipped before persistence",
        &["reason"]
    )
    .unwrap()
});

/// New records written.
/// Labels: sink (ledger/remote)
pub static RECORDS_WRITTEN_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_records_written_total",
        "New token records written",
        &["sink"]
    )
    .unwrap()
});

/// Records already present in a sink.
pub static RECORDS_DUPLICATE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_records_duplicate_total",
        "Token records already present in a sink",
        &["sink"]
    )
    .unwrap()
});

/// Failed sink operations.
pub static SINK_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mintscan_sink_failures_total",
        "Failed sink operations",
        &["sink"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record feed socket opened.
    pub fn ws_connected() {
        WS_CONNECTED.set(1.0);
    }

    /// Record feed socket closed.
    pub fn ws_disconnected() {
        WS_CONNECTED.set(0.0);
    }

    /// Set feed state machine state.
    /// Only the active state is set to 1, all others to 0.
    pub fn ws_state_set(state: &str) {
        for s in &["disconnected", "connecting", "subscribed", "receiving"] {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Record feed reconnect.
    pub fn ws_reconnect(reason: &str) {
        WS_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a subscription intent sent.
    pub fn subscription_sent(method: &str) {
        SUBSCRIPTIONS_SENT_TOTAL.with_label_values(&[method]).inc();
    }

    /// Record a frame received.
    pub fn frame_received() {
        FRAMES_RECEIVED_TOTAL.inc();
    }

    /// Record a skipped frame.
    pub fn frame_skipped(reason: &str) {
        FRAMES_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a new record written to a sink.
    pub fn record_written(sink: &str) {
        RECORDS_WRITTEN_TOTAL.with_label_values(&[sink]).inc();
    }

    /// Record a record already present in a sink.
    pub fn record_duplicate(sink: &str) {
        RECORDS_DUPLICATE_TOTAL.with_label_values(&[sink]).inc();
    }

    /// Record a failed sink operation.
    pub fn sink_failed(sink: &str) {
        SINK_FAILURES_TOTAL.with_label_values(&[sink]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_set_is_exclusive() {
        Metrics::ws_state_set("connecting");
        Metrics::ws_state_set("receiving");
        assert_eq!(WS_STATE.with_label_values(&["connecting"]).get(), 0.0);
        assert_eq!(WS_STATE.with_label_values(&["receiving"]).get(), 1.0);
    }

    #[test]
    fn test_counters_increment() {
        let before = RECORDS_WRITTEN_TOTAL.with_label_values(&["ledger"]).get();
        Metrics::record_written("ledger");
        let after = RECORDS_WRITTEN_TOTAL.with_label_values(&["ledger"]).get();
        assert!(after >= before + 1.0);
    }
}
