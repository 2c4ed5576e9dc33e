//! Feed connection manager.
//!
//! Handles the connection lifecycle: connect, send the subscription intents,
//! hand every inbound frame to a `FrameHandler`, and reconnect after a fixed
//! delay on any failure or close. Runs until shutdown is requested.

use crate::error::{WsError, WsResult};
use crate::message::{Frame, SubscriptionIntent};
use crate::state::{FeedEvent, FeedState};
use crate::transport::{BoxFuture, FeedSession, FeedTransport};
use mintscan_telemetry::Metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default feed endpoint.
pub const DEFAULT_FEED_URL: &str = "wss://pumpportal.fun/api/data";

/// Default delay between a disconnect and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// Consumer of inbound text frames.
///
/// Frames are delivered one at a time; the next frame is not read until
/// the returned future completes.
pub trait FrameHandler: Send {
    fn handle_frame<'a>(&'a mut self, frame: &'a str) -> BoxFuture<'a, ()>;
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Fixed delay before reconnecting.
    pub reconnect_delay_ms: u64,
    /// Intents sent after every successful connect.
    pub subscriptions: Vec<SubscriptionIntent>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            subscriptions: SubscriptionIntent::standard_set(Vec::new(), Vec::new()),
        }
    }
}

/// How a session ended without a transport fault.
enum SessionEnd {
    Shutdown,
}

/// Feed connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    transport: Box<dyn FeedTransport>,
    state: Arc<RwLock<FeedState>>,
    /// Total reconnects since start.
    reconnect_count: Arc<RwLock<u32>>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(config: ConnectionConfig, transport: Box<dyn FeedTransport>) -> Self {
        Self {
            config,
            transport,
            state: Arc::new(RwLock::new(FeedState::Disconnected)),
            reconnect_count: Arc::new(RwLock::new(0)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> FeedState {
        *self.state.read()
    }

    /// Number of reconnects since start.
    pub fn reconnect_count(&self) -> u32 {
        *self.reconnect_count.read()
    }

    /// Signal graceful shutdown.
    ///
    /// Interrupts the receive loop, any in-flight frame handling, and the
    /// reconnect delay.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Run the connection lifecycle until shutdown.
    ///
    /// Never returns on connection failure; every fault leads to a fixed
    /// delay and a fresh connect.
    pub async fn run<H>(&self, handler: &mut H)
    where
        H: FrameHandler + ?Sized,
    {
        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                self.apply(FeedEvent::Shutdown);
                return;
            }

            self.apply(FeedEvent::Connect);

            match self.run_session(handler).await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Feed session stopped by shutdown");
                    self.apply(FeedEvent::Shutdown);
                    return;
                }
                Err(e) => {
                    error!(error = %e, "Feed connection error");
                    self.apply(FeedEvent::Fault);
                    Metrics::ws_reconnect(e.reason_label());
                }
            }

            let attempt = {
                let mut count = self.reconnect_count.write();
                *count += 1;
                *count
            };
            let delay = Duration::from_millis(self.config.reconnect_delay_ms);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            // Wait for delay OR shutdown signal (cancellation-aware sleep)
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during reconnect delay, exiting");
                    self.apply(FeedEvent::Shutdown);
                    return;
                }
            }
        }
    }

    async fn run_session<H>(&self, handler: &mut H) -> WsResult<SessionEnd>
    where
        H: FrameHandler + ?Sized,
    {
        info!(url = %self.config.url, "Connecting to feed");

        let mut session = tokio::select! {
            biased;
            () = self.shutdown_token.cancelled() => return Ok(SessionEnd::Shutdown),
            result = self.transport.connect(&self.config.url) => result?,
        };

        self.apply(FeedEvent::Opened);
        Metrics::ws_connected();
        info!("Feed connected");

        let result = self.receive_loop(session.as_mut(), handler).await;
        Metrics::ws_disconnected();
        result
    }

    async fn receive_loop<H>(
        &self,
        session: &mut dyn FeedSession,
        handler: &mut H,
    ) -> WsResult<SessionEnd>
    where
        H: FrameHandler + ?Sized,
    {
        self.send_subscriptions(session).await?;
        self.apply(FeedEvent::SubscriptionsSent);
        info!("Monitoring feed messages");

        loop {
            let frame = tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in receive loop");
                    if let Err(e) = session.close().await {
                        warn!(error = %e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(SessionEnd::Shutdown);
                }
                frame = session.next_frame() => frame,
            };

            let text = match frame {
                Some(Ok(Frame::Text(text))) => text,
                Some(Ok(Frame::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Skipping non-UTF-8 binary frame");
                        Metrics::frame_skipped("non_utf8");
                        continue;
                    }
                },
                Some(Ok(Frame::Close { code, reason })) => {
                    warn!(code, %reason, "Feed closed by server");
                    return Err(WsError::ConnectionClosed { code, reason });
                }
                Some(Err(e)) => {
                    error!(error = %e, "Feed read error");
                    return Err(e);
                }
                None => {
                    warn!("Feed stream ended");
                    return Err(WsError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            };

            self.apply(FeedEvent::FrameReceived);
            Metrics::frame_received();

            // In-flight handling is abandoned on shutdown
            tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received while handling frame");
                    return Ok(SessionEnd::Shutdown);
                }
                () = handler.handle_frame(&text) => {}
            }
        }
    }

    async fn send_subscriptions(&self, session: &mut dyn FeedSession) -> WsResult<()> {
        info!(
            count = self.config.subscriptions.len(),
            "Sending subscription intents"
        );

        for intent in &self.config.subscriptions {
            let text = intent.to_text()?;
            session.send_text(text).await?;
            Metrics::subscription_sent(intent.method.as_str());
            info!(method = %intent.method, keys = ?intent.keys, "Subscribed");
        }

        Ok(())
    }

    fn apply(&self, event: FeedEvent) -> FeedState {
        let (from, to) = {
            let mut state = self.state.write();
            let from = *state;
            *state = from.next(event);
            (from, *state)
        };

        if from != to {
            debug!(%from, %to, ?event, "Feed state transition");
            Metrics::ws_state_set(to.as_str());
        }
        to
    }
}
