//! Integration tests for mintscan-bot.
//!
//! These tests run the application against a local WebSocket server:
//! - subscription intents on every connect
//! - frames flowing into the ledger and remote store
//! - reconnection after a server close

pub mod common;
