//! Feed WebSocket client for mintscan.
//!
//! Provides a self-healing feed connection with:
//! - An explicit connection state machine (`FeedState`)
//! - Subscription intents resent on every connect
//! - Fixed-delay reconnection with no retry bound
//! - A transport seam (`FeedTransport`) so the lifecycle runs against fakes

pub mod connection;
pub mod error;
pub mod message;
pub mod state;
pub mod transport;

pub use connection::{ConnectionConfig, ConnectionManager, FrameHandler};
pub use error::{WsError, WsResult};
pub use message::{FeedMethod, Frame, SubscriptionIntent};
pub use state::{FeedEvent, FeedState};
pub use transport::{BoxFuture, FeedSession, FeedTransport, TungsteniteTransport};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
