//! LRU Index Module
//!
//! Access-order bookkeeping for memory store eviction. Every touch stamps the
//! key with a fresh tick; the smallest tick is the least recently used key.

use std::collections::{BTreeMap, HashMap};

// == LRU Index ==
/// Ordered index of keys by last access, O(log n) per touch and eviction.
#[derive(Debug, Default)]
pub struct LruIndex {
    next_tick: u64,
    ticks: HashMap<String, u64>,
    by_tick: BTreeMap<u64, String>,
}

impl LruIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as the most recently used.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(old) => {
                if let Some(owned) = self.by_tick.remove(&*old) {
                    self.by_tick.insert(tick, owned);
                }
                *old = tick;
            }
            None => {
                self.ticks.insert(key.to_string(), tick);
                self.by_tick.insert(tick, key.to_string());
            }
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.by_tick.values().next()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
