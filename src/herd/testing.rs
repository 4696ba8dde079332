//! Store test doubles for herd protocol tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{StoreError, StoreResult};
use crate::store::{MemoryStore, Store};

/// One call observed by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    GetMulti(Vec<String>),
    Set { key: String, value: Vec<u8>, ttl: u64 },
    SetMulti { items: HashMap<String, Vec<u8>>, ttl: u64 },
    Add { key: String, value: Vec<u8>, ttl: u64 },
    Delete(String),
}

/// A [`MemoryStore`] that logs every call made through the [`Store`] trait.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    pub memory: MemoryStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            memory: MemoryStore::new(1000, 300),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    StoreCall::Set { .. } | StoreCall::SetMulti { .. } | StoreCall::Add { .. }
                )
            })
            .collect()
    }
}

impl Store for RecordingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.record(StoreCall::Get(key.to_string()));
        self.memory.get(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> StoreResult<HashMap<String, Vec<u8>>> {
        let mut sorted = keys.to_vec();
        sorted.sort();
        self.record(StoreCall::GetMulti(sorted));
        self.memory.get_multi(keys).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: u64) -> StoreResult<()> {
        self.record(StoreCall::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        });
        self.memory.set(key, value, ttl).await
    }

    async fn set_multi(&self, items: HashMap<String, Vec<u8>>, ttl: u64) -> StoreResult<()> {
        self.record(StoreCall::SetMulti {
            items: items.clone(),
            ttl,
        });
        self.memory.set_multi(items, ttl).await
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: u64) -> StoreResult<bool> {
        self.record(StoreCall::Add {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        });
        self.memory.add(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.record(StoreCall::Delete(key.to_string()));
        self.memory.delete(key).await
    }
}

/// A store whose every call fails as if the backend were down.
#[derive(Debug, Clone, Default)]
pub struct DownStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

impl Store for DownStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        down()
    }

    async fn get_multi(&self, _keys: &[String]) -> StoreResult<HashMap<String, Vec<u8>>> {
        down()
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: u64) -> StoreResult<()> {
        down()
    }

    async fn set_multi(&self, _items: HashMap<String, Vec<u8>>, _ttl: u64) -> StoreResult<()> {
        down()
    }

    async fn add(&self, _key: &str, _value: Vec<u8>, _ttl: u64) -> StoreResult<bool> {
        down()
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        down()
    }
}
