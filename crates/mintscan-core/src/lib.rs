//! Core domain types for the mintscan ingester.
//!
//! This crate provides the types shared by every other crate:
//! - `TokenRecord`: the unit of persistence (address, name, symbol, observed_at)
//! - `TokenFields`: the fields extracted from a feed message before stamping
//! - `classify`: the pure decision of whether a feed payload is storable

pub mod classifier;
pub mod error;
pub mod record;

pub use classifier::{classify, decode_frame, is_signed, signature_preview};
pub use error::{CoreError, Result};
pub use record::{TokenFields, TokenRecord, LEDGER_TIMESTAMP_FORMAT};
