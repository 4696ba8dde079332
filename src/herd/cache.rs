//! Single-key herd operations.

use tracing::debug;

use crate::error::StoreResult;
use crate::herd::envelope;
use crate::herd::{HerdCache, KeyMaker};
use crate::store::Store;

impl<S: Store, K: KeyMaker> HerdCache<S, K> {
    // == Add ==
    /// Stores `value` only if `key` is absent. Returns true iff it was written.
    pub async fn add(
        &self,
        key: &str,
        value: &[u8],
        timeout: Option<u64>,
        version: Option<u32>,
        herd: bool,
    ) -> StoreResult<bool> {
        let packed = self.encode(value, timeout, herd);
        let ttl = self.store_ttl(timeout, herd);
        let key = self.keys.make_key(key, version);

        self.store.add(&key, packed, ttl).await
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any existing value.
    pub async fn set(
        &self,
        key: &str,
        value: &[u8],
        timeout: Option<u64>,
        version: Option<u32>,
        herd: bool,
    ) -> StoreResult<()> {
        let packed = self.encode(value, timeout, herd);
        let ttl = self.store_ttl(timeout, herd);
        let key = self.keys.make_key(key, version);

        self.store.set(&key, packed, ttl).await
    }

    // == Get ==
    /// Reads `key`, returning `None` on a miss.
    ///
    /// A value past its herd expiry is also reported as a miss, and its bare
    /// payload is written back for `herd_timeout` seconds so concurrent
    /// readers keep hitting while this caller recomputes and sets it again.
    pub async fn get(&self, key: &str, version: Option<u32>) -> StoreResult<Option<Vec<u8>>> {
        let key = self.keys.make_key(key, version);
        let Some(stored) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let (value, refresh) = envelope::unpack(stored);
        if refresh {
            debug!(
                "Herd expiry reached for {}, serving miss and holding value for {}s",
                key, self.settings.herd_timeout
            );
            self.store
                .set(&key, value, self.hold_ttl())
                .await?;
            return Ok(None);
        }

        Ok(Some(value))
    }

    /// Like [`get`](Self::get) but substitutes `default` for a miss.
    pub async fn get_or(
        &self,
        key: &str,
        default: Vec<u8>,
        version: Option<u32>,
    ) -> StoreResult<Vec<u8>> {
        Ok(self.get(key, version).await?.unwrap_or(default))
    }

    // == Delete ==
    /// Removes `key`. Returns true iff it existed.
    pub async fn delete(&self, key: &str, version: Option<u32>) -> StoreResult<bool> {
        let key = self.keys.make_key(key, version);
        self.store.delete(&key).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::StoreError;
    use crate::herd::envelope::{now_secs, pack_at, StoredValue};
    use crate::herd::testing::{DownStore, RecordingStore, StoreCall};
    use crate::herd::{HerdCache, HerdSettings, PrefixKeyMaker};
    use crate::store::Store;

    fn settings() -> HerdSettings {
        HerdSettings {
            herd_timeout: 60,
            default_timeout: 300,
        }
    }

    fn cache() -> HerdCache<RecordingStore> {
        HerdCache::new(RecordingStore::new(), PrefixKeyMaker::default(), settings())
    }

    /// Writes an envelope whose herd expiry passed `ago` seconds ago.
    async fn write_stale(cache: &HerdCache<RecordingStore>, key: &str, value: &[u8], ago: i64) {
        let (packed, ttl) = pack_at(value, 10, 60, now_secs() - 10 - ago);
        cache.store().memory.set(key, packed, ttl).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_extends_store_ttl_by_herd_timeout() {
        let cache = cache();

        cache.set("k", b"v", Some(30), None, true).await.unwrap();

        let calls = cache.store().calls();
        assert_eq!(calls.len(), 1);
        let StoreCall::Set { key, value, ttl } = &calls[0] else {
            panic!("expected a set, got {:?}", calls[0]);
        };
        assert_eq!(key, ":1:k");
        assert_eq!(*ttl, 90);
        assert!(matches!(
            StoredValue::decode(value.clone()),
            StoredValue::Envelope { ref payload, .. } if payload == b"v"
        ));
    }

    #[tokio::test]
    async fn test_set_without_timeout_uses_default() {
        let cache = cache();

        cache.set("k", b"v", None, None, true).await.unwrap();

        let StoreCall::Set { value, ttl, .. } = &cache.store().calls()[0] else {
            panic!("expected a set");
        };
        assert_eq!(*ttl, 360);
        let StoredValue::Envelope { herd_expiry, .. } = StoredValue::decode(value.clone()) else {
            panic!("expected an envelope");
        };
        let until_expiry = herd_expiry - now_secs();
        assert!((299..=300).contains(&until_expiry));
    }

    #[tokio::test]
    async fn test_set_zero_timeout_writes_bare_value() {
        let cache = cache();

        cache.set("k", b"v", Some(0), None, true).await.unwrap();

        assert_eq!(
            cache.store().calls(),
            vec![StoreCall::Set {
                key: ":1:k".to_string(),
                value: b"v".to_vec(),
                ttl: 0,
            }]
        );
    }

    #[tokio::test]
    async fn test_set_without_herd_writes_bare_value() {
        let cache = cache();

        cache.set("k", b"v", Some(30), None, false).await.unwrap();

        assert_eq!(
            cache.store().calls(),
            vec![StoreCall::Set {
                key: ":1:k".to_string(),
                value: b"v".to_vec(),
                ttl: 30,
            }]
        );
    }

    #[tokio::test]
    async fn test_get_fresh_value() {
        let cache = cache();
        cache.set("k", b"v", Some(30), None, true).await.unwrap();

        assert_eq!(cache.get("k", None).await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none_without_writes() {
        let cache = cache();

        assert_eq!(cache.get("missing", None).await.unwrap(), None);
        assert_eq!(
            cache.get_or("missing", b"fallback".to_vec(), None).await.unwrap(),
            b"fallback"
        );
        assert!(cache.store().writes().is_empty());
    }

    #[tokio::test]
    async fn test_get_stale_reinserts_bare_value_and_misses() {
        let cache = cache();
        write_stale(&cache, ":1:k", b"v", 5).await;

        assert_eq!(cache.get_or("k", b"default".to_vec(), None).await.unwrap(), b"default");

        assert_eq!(
            cache.store().writes(),
            vec![StoreCall::Set {
                key: ":1:k".to_string(),
                value: b"v".to_vec(),
                ttl: 60,
            }]
        );
        let ttl = cache.store().memory.ttl_remaining(":1:k").await.unwrap().unwrap();
        assert!((59..=60).contains(&ttl));

        // The next reader gets the held bare value without another refresh.
        cache.store().clear();
        assert_eq!(cache.get("k", None).await.unwrap(), Some(b"v".to_vec()));
        assert!(cache.store().writes().is_empty());
    }

    #[tokio::test]
    async fn test_get_bare_value_is_served_as_is() {
        let cache = cache();
        cache.store().memory.set(":1:k", b"legacy".to_vec(), 0).await.unwrap();

        assert_eq!(cache.get("k", None).await.unwrap(), Some(b"legacy".to_vec()));
        assert!(cache.store().writes().is_empty());
    }

    #[tokio::test]
    async fn test_version_is_threaded_to_key_maker() {
        let cache = cache();

        cache.set("k", b"v2", Some(30), Some(2), true).await.unwrap();

        assert_eq!(cache.get("k", None).await.unwrap(), None);
        assert_eq!(cache.get("k", Some(2)).await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_add_twice_keeps_first_value() {
        let cache = cache();

        assert!(cache.add("y", b"v", Some(0), None, true).await.unwrap());
        assert!(!cache.add("y", b"v2", Some(0), None, true).await.unwrap());
        assert_eq!(cache.get("y", None).await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_add_with_herd_packs_value() {
        let cache = cache();

        assert!(cache.add("k", b"v", Some(10), None, true).await.unwrap());

        let StoreCall::Add { value, ttl, .. } = &cache.store().calls()[0] else {
            panic!("expected an add");
        };
        assert_eq!(*ttl, 70);
        assert!(matches!(
            StoredValue::decode(value.clone()),
            StoredValue::Envelope { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = cache();
        cache.set("k", b"v", Some(30), None, true).await.unwrap();

        assert!(cache.delete("k", None).await.unwrap());
        assert_eq!(cache.get("k", None).await.unwrap(), None);
        assert!(!cache.delete("k", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_set_misses_once_then_serves_held_value() {
        let cache = cache();
        cache.set("x", b"v1", Some(1), None, true).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get("x", None).await.unwrap(), None);
        assert_eq!(cache.get("x", None).await.unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let cache = HerdCache::new(DownStore, PrefixKeyMaker::default(), settings());
        let down = StoreError::Unavailable("connection refused".to_string());

        assert_eq!(cache.get("k", None).await, Err(down.clone()));
        assert_eq!(cache.set("k", b"v", None, None, true).await, Err(down.clone()));
        assert_eq!(cache.add("k", b"v", None, None, true).await, Err(down.clone()));
        assert_eq!(cache.delete("k", None).await, Err(down));
    }

    #[tokio::test]
    async fn test_concurrent_readers_of_stale_value_all_get_answers() {
        let cache = std::sync::Arc::new(cache());
        write_stale(&cache, ":1:hot", b"v", 1).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get("hot", None).await }));
        }

        let mut misses = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                None => misses += 1,
                Some(value) => assert_eq!(value, b"v"),
            }
        }

        // At least one reader is elected to recompute; the rest see the held value.
        assert!(misses >= 1);
        assert_eq!(cache.store().memory.peek(":1:hot").await, Some(b"v".to_vec()));
    }
}
