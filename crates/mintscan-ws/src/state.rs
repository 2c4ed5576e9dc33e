//! Feed connection state machine.
//!
//! ```text
//! Disconnected --Connect--> Connecting --Opened--> Subscribed
//!      ^                                               |
//!      |                                        SubscriptionsSent
//!      |                                               v
//!      +-------------Fault | Shutdown------------- Receiving <--FrameReceived
//! ```
//!
//! `Fault` and `Shutdown` lead to `Disconnected` from every state. Events
//! that do not apply to the current state leave it unchanged.

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    Receiving,
}

/// Lifecycle event driving a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    /// Start (or retry) opening the socket.
    Connect,
    /// Socket opened.
    Opened,
    /// All subscription intents written.
    SubscriptionsSent,
    /// Inbound frame delivered to the handler.
    FrameReceived,
    /// Connect failure, send failure, receive error or close.
    Fault,
    /// Operator interrupt.
    Shutdown,
}

impl FeedState {
    /// Apply an event and return the next state.
    pub fn next(self, event: FeedEvent) -> FeedState {
        use FeedEvent as E;
        use FeedState as S;

        match (self, event) {
            (_, E::Fault) | (_, E::Shutdown) => S::Disconnected,
            (S::Disconnected, E::Connect) => S::Connecting,
            (S::Connecting, E::Opened) => S::Subscribed,
            (S::Subscribed, E::SubscriptionsSent) => S::Receiving,
            (S::Receiving, E::FrameReceived) => S::Receiving,
            (state, _) => state,
        }
    }

    /// Metric label for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Receiving => "receiving",
        }
    }

    /// All states, for resetting per-state gauges.
    pub const ALL: [FeedState; 4] = [
        FeedState::Disconnected,
        FeedState::Connecting,
        FeedState::Subscribed,
        FeedState::Receiving,
    ];
}

impl std::fmt::Display for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
