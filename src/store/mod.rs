//! Store Module
//!
//! The byte-oriented backend capability the herd layer sits on, plus an
//! in-process memcached-like implementation.

mod entry;
mod lru;
mod memory;
mod stats;


use std::collections::HashMap;
use std::future::Future;

use crate::error::StoreResult;

// Re-export public types
pub use entry::{StoreEntry, MAX_RELATIVE_TTL};
pub use memory::MemoryStore;
pub use stats::StoreStats;

// == Public Constants ==
/// Maximum allowed key length in bytes (memcached's limit)
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Store Trait ==
/// A memcached-style key-value backend over opaque physical keys and bytes.
///
/// TTLs are in seconds with the backend's own conventions (for memcached,
/// `0` is the server default and values past 30 days are absolute Unix
/// timestamps). A miss is `None` / an absent map entry, never an error.
pub trait Store: Send + Sync {
    /// Fetches one key.
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<Vec<u8>>>> + Send;

    /// Fetches many keys in one round-trip. Absent keys are omitted.
    fn get_multi(
        &self,
        keys: &[String],
    ) -> impl Future<Output = StoreResult<HashMap<String, Vec<u8>>>> + Send;

    /// Stores a value unconditionally.
    fn set(&self, key: &str, value: Vec<u8>, ttl: u64)
        -> impl Future<Output = StoreResult<()>> + Send;

    /// Stores many values with one shared TTL.
    fn set_multi(
        &self,
        items: HashMap<String, Vec<u8>>,
        ttl: u64,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Stores a value only if the key is absent. Returns true iff written.
    fn add(&self, key: &str, value: Vec<u8>, ttl: u64)
        -> impl Future<Output = StoreResult<bool>> + Send;

    /// Removes a key. Returns true iff it existed.
    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<bool>> + Send;
}
