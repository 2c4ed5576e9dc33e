//! In-process remote store.
//!
//! Holds rows in a map keyed by address and enforces the same unique
//! constraint the hosted table does. Failures can be injected per
//! operation so callers can exercise their error paths.

use crate::error::{StoreError, StoreResult};
use crate::remote::{BoxFuture, RemoteStore};
use mintscan_core::TokenRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, TokenRecord>>,
    exists_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    fail_exists: AtomicBool,
    fail_inserts: AtomicBool,
    missing_table: AtomicBool,
    stale_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = TokenRecord>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock();
            for record in records {
                rows.insert(record.address.clone(), record);
            }
        }
        store
    }

    /// Make every `exists` call fail.
    pub fn set_fail_exists(&self, fail: bool) {
        self.fail_exists.store(fail, Ordering::SeqCst);
    }

    /// Make every `insert` call fail.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make `exists` report every address as absent, as a lookup that lost a
    /// race with another writer would.
    pub fn set_stale_lookups(&self, stale: bool) {
        self.stale_lookups.store(stale, Ordering::SeqCst);
    }

    /// Make `ensure_ready` report a missing table.
    pub fn set_missing_table(&self, missing: bool) {
        self.missing_table.store(missing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.rows.lock().contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<TokenRecord> {
        self.rows.lock().get(address).cloned()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn check_ready(&self) -> StoreResult<()> {
        if self.missing_table.load(Ordering::SeqCst) {
            return Err(StoreError::MissingTable {
                table: crate::supabase::DEFAULT_TABLE.to_string(),
                schema_sql: crate::supabase::schema_sql(crate::supabase::DEFAULT_TABLE),
            });
        }
        Ok(())
    }

    fn check_exists(&self, address: &str) -> StoreResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(StoreError::Http("injected exists failure".to_string()));
        }
        if self.stale_lookups.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.contains(address))
    }

    fn store_row(&self, record: &TokenRecord) -> StoreResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 500,
                body: "injected insert failure".to_string(),
            });
        }

        let mut rows = self.rows.lock();
        if rows.contains_key(&record.address) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value for token_address={}",
                record.address
            )));
        }
        rows.insert(record.address.clone(), record.clone());
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn ensure_ready(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move { self.check_ready() })
    }

    fn exists<'a>(&'a self, address: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(async move { self.check_exists(address) })
    }

    fn insert<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move { self.store_row(record) })
    }
}
