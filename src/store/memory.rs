//! Memory Store Module
//!
//! In-process memcached-like store: HashMap storage with LRU eviction and
//! TTL expiration, shared behind an async RwLock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::entry::current_timestamp_ms;
use crate::store::lru::LruIndex;
use crate::store::{Store, StoreEntry, StoreStats, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

// == Memory Store ==
/// Cloneable handle to a shared in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Slab>>,
}

/// The unsynchronized storage behind a [`MemoryStore`].
#[derive(Debug)]
struct Slab {
    entries: HashMap<String, StoreEntry>,
    lru: LruIndex,
    stats: StoreStats,
    max_entries: usize,
    /// TTL applied when a write passes `0`
    default_ttl: u64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` items.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity before LRU eviction kicks in
    /// * `default_ttl` - TTL in seconds used when a write passes `0`
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Slab {
                entries: HashMap::new(),
                lru: LruIndex::new(),
                stats: StoreStats::new(),
                max_entries,
                default_ttl,
            })),
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> StoreStats {
        let slab = self.inner.read().await;
        let mut stats = slab.stats.clone();
        stats.set_total_entries(slab.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    // == TTL Remaining ==
    /// Remaining lifetime of a live key in seconds (rounded up).
    ///
    /// `None` when the key is absent or expired, `Some(None)` when it never expires.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Option<u64>> {
        let slab = self.inner.read().await;
        slab.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoreEntry::ttl_remaining)
    }

    /// Raw stored bytes of a live key, without touching stats or LRU order.
    pub async fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let slab = self.inner.read().await;
        slab.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Slab {
    // == Lookup ==
    /// Returns a live value, dropping it first if it has expired.
    fn lookup(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn contains_live(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Insert ==
    /// Writes an entry, evicting the least recently used key when at capacity.
    fn insert(&mut self, key: String, value: Vec<u8>, ttl: u64) -> StoreResult<()> {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    debug!("Evicting least recently used key {}", evicted);
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(StoreError::Full(
                        "store is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let entry = StoreEntry::new(value, ttl, self.default_ttl);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }

    fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }
}

// == Validation ==
/// Rejects keys memcached would refuse.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(StoreError::InvalidKey(format!(
            "key {:?} contains whitespace or control characters",
            key
        )));
    }
    Ok(())
}

fn validate_value(value: &[u8]) -> StoreResult<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(StoreError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

// == Store Implementation ==
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.inner.write().await.lookup(key))
    }

    async fn get_multi(&self, keys: &[String]) -> StoreResult<HashMap<String, Vec<u8>>> {
        for key in keys {
            validate_key(key)?;
        }

        let mut slab = self.inner.write().await;
        let found = keys
            .iter()
            .filter_map(|key| slab.lookup(key).map(|value| (key.clone(), value)))
            .collect();

        Ok(found)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: u64) -> StoreResult<()> {
        validate_key(key)?;
        validate_value(&value)?;
        self.inner.write().await.insert(key.to_string(), value, ttl)
    }

    async fn set_multi(&self, items: HashMap<String, Vec<u8>>, ttl: u64) -> StoreResult<()> {
        for (key, value) in &items {
            validate_key(key)?;
            validate_value(value)?;
        }

        let mut slab = self.inner.write().await;
        for (key, value) in items {
            slab.insert(key, value, ttl)?;
        }

        Ok(())
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: u64) -> StoreResult<bool> {
        validate_key(key)?;
        validate_value(&value)?;

        let mut slab = self.inner.write().await;
        if slab.contains_live(key) {
            return Ok(false);
        }
        slab.insert(key.to_string(), value, ttl)?;

        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;

        let mut slab = self.inner.write().await;
        let live = slab.contains_live(key);
        slab.remove(key);

        Ok(live)
    }
}
