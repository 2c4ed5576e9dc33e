//! Token record types.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used in ledger rows and observation logs.
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fields extracted from a classified feed message.
///
/// Not yet stamped with an observation time; see [`TokenFields::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFields {
    /// Token address (natural key). Never empty.
    pub address: String,
    /// Token name, empty if the payload carried none.
    pub name: String,
    /// Token symbol, empty if the payload carried none.
    pub symbol: String,
}

impl TokenFields {
    /// Stamp the fields with the given observation time.
    pub fn observe_at(self, observed_at: DateTime<Utc>) -> TokenRecord {
        TokenRecord {
            address: self.address,
            name: self.name,
            symbol: self.symbol,
            observed_at,
        }
    }

    /// Stamp the fields with the current time.
    pub fn observe(self) -> TokenRecord {
        self.observe_at(Utc::now())
    }
}

/// A token observed on the feed, ready to be persisted.
///
/// Created once per address at first sighting and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub address: String,
    pub name: String,
    pub symbol: String,
    /// Processing time, not taken from the upstream payload.
    pub observed_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Build a record, rejecting an empty address.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(CoreError::InvalidRecord(
                "token address must not be empty".to_string(),
            ));
        }
        Ok(Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            observed_at,
        })
    }

    /// Observation time rendered in the ledger format.
    pub fn timestamp_string(&self) -> String {
        self.observed_at.format(LEDGER_TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} / {})", self.address, self.name, self.symbol)
    }
}
