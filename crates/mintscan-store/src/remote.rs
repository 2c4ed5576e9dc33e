//! Remote store trait.
//!
//! Abstracts the hosted token table so the ingester can run against:
//! - the PostgREST client in production
//! - an in-memory store in tests

use crate::error::StoreResult;
use mintscan_core::TokenRecord;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Remote table of tokens keyed by a unique address.
pub trait RemoteStore: Send + Sync {
    /// Verify the table is reachable. Called once at startup; any error is fatal.
    fn ensure_ready(&self) -> BoxFuture<'_, StoreResult<()>>;

    /// Check whether a row for `address` exists.
    fn exists<'a>(&'a self, address: &'a str) -> BoxFuture<'a, StoreResult<bool>>;

    /// Insert a row for `record`.
    fn insert<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, StoreResult<()>>;
}

/// Arc wrapper for RemoteStore trait objects.
pub type DynRemoteStore = Arc<dyn RemoteStore>;
