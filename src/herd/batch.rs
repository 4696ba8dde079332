//! Multi-key herd operations.
//!
//! Same protocol as the single-key path, one store round-trip per direction.

use std::collections::HashMap;

use tracing::debug;

use crate::error::StoreResult;
use crate::herd::envelope::{now_secs, unpack_at};
use crate::herd::{HerdCache, KeyMaker};
use crate::store::Store;

impl<S: Store, K: KeyMaker> HerdCache<S, K> {
    // == Get Many ==
    /// Reads several keys with a single `get_multi`.
    ///
    /// The result is keyed by the logical keys given and contains every one of
    /// them; misses and herd-stale values are `None`. Stale payloads are held
    /// with one `set_multi` for `herd_timeout` seconds.
    pub async fn get_many<Q: AsRef<str>>(
        &self,
        keys: &[Q],
        version: Option<u32>,
    ) -> StoreResult<HashMap<String, Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        // physical -> logical
        let reverse: HashMap<String, String> = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                (self.keys.make_key(key, version), key.to_string())
            })
            .collect();
        let physical: Vec<String> = reverse.keys().cloned().collect();

        let mut found = self.store.get_multi(&physical).await?;

        let now = now_secs();
        let mut reinsert = HashMap::new();
        let mut result = HashMap::with_capacity(reverse.len());

        for (physical_key, logical_key) in reverse {
            let value = match found.remove(&physical_key) {
                None => None,
                Some(stored) => {
                    let (value, refresh) = unpack_at(stored, now);
                    if refresh {
                        reinsert.insert(physical_key, value);
                        None
                    } else {
                        Some(value)
                    }
                }
            };
            result.insert(logical_key, value);
        }

        if !reinsert.is_empty() {
            debug!(
                "Herd expiry reached for {} of {} keys, holding them for {}s",
                reinsert.len(),
                result.len(),
                self.settings.herd_timeout
            );
            self.store
                .set_multi(reinsert, self.hold_ttl())
                .await?;
        }

        Ok(result)
    }

    // == Set Many ==
    /// Writes several values with a single `set_multi`.
    ///
    /// Each value gets its own envelope, but the whole batch shares one store
    /// TTL computed from `timeout` exactly as [`set`](Self::set) would.
    pub async fn set_many(
        &self,
        data: &HashMap<String, Vec<u8>>,
        timeout: Option<u64>,
        version: Option<u32>,
        herd: bool,
    ) -> StoreResult<()> {
        let ttl = self.store_ttl(timeout, herd);
        let packed = data
            .iter()
            .map(|(key, value)| {
                (
                    self.keys.make_key(key, version),
                    self.encode(value, timeout, herd),
                )
            })
            .collect();

        self.store.set_multi(packed, ttl).await
    }
}
