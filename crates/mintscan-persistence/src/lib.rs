//! Local token ledger for mintscan.
//!
//! Records every newly seen token to an append-only CSV file that serves
//! as the authoritative local backup and the local deduplication source.

pub mod error;
pub mod ledger;

pub use error::{PersistenceError, PersistenceResult};
pub use ledger::{AppendOutcome, CsvLedger, LedgerRow, LEDGER_HEADER};
