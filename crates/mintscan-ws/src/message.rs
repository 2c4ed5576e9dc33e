//! Feed message types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Subscription intents (outgoing)
// ============================================================================

/// Feed subscription methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedMethod {
    /// Token creation events.
    #[serde(rename = "subscribeNewToken")]
    NewToken,
    /// Trades made by the listed accounts.
    #[serde(rename = "subscribeAccountTrade")]
    AccountTrade,
    /// Trades on the listed tokens.
    #[serde(rename = "subscribeTokenTrade")]
    TokenTrade,
}

impl FeedMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewToken => "subscribeNewToken",
            Self::AccountTrade => "subscribeAccountTrade",
            Self::TokenTrade => "subscribeTokenTrade",
        }
    }
}

impl std::fmt::Display for FeedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription intent sent once per channel after every connect.
///
/// Wire format: `{"method": "...", "keys": [...]}`, `keys` omitted when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionIntent {
    pub method: FeedMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

impl SubscriptionIntent {
    /// Subscribe to token creation events.
    pub fn new_tokens() -> Self {
        Self {
            method: FeedMethod::NewToken,
            keys: None,
        }
    }

    /// Subscribe to trades made by the given accounts.
    pub fn account_trades(accounts: Vec<String>) -> Self {
        Self {
            method: FeedMethod::AccountTrade,
            keys: Some(accounts),
        }
    }

    /// Subscribe to trades on the given tokens.
    pub fn token_trades(tokens: Vec<String>) -> Self {
        Self {
            method: FeedMethod::TokenTrade,
            keys: Some(tokens),
        }
    }

    /// The three channel intents: creation, account trades, token trades.
    pub fn standard_set(accounts: Vec<String>, tokens: Vec<String>) -> Vec<Self> {
        vec![
            Self::new_tokens(),
            Self::account_trades(accounts),
            Self::token_trades(tokens),
        ]
    }

    /// Serialize to the wire JSON text.
    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Inbound frames
// ============================================================================

/// Inbound frame surfaced by a feed session.
///
/// Ping/pong control traffic is answered inside the session and never
/// surfaces here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close { code: u16, reason: String },
}
