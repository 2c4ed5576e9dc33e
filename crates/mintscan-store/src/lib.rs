//! Remote token store for mintscan.
//!
//! A thin adapter over a hosted relational table of tokens keyed by
//! `token_address`:
//! - `RemoteStore`: the existence-check / insert seam used by the ingester
//! - `SupabaseStore`: PostgREST implementation over HTTPS
//! - `MemoryStore`: in-process implementation with fault injection

pub mod error;
pub mod memory;
pub mod remote;
pub mod supabase;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use remote::{BoxFuture, DynRemoteStore, RemoteStore};
pub use supabase::{schema_sql, StoreConfig, SupabaseStore};
