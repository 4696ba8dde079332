//! Herd Module
//!
//! Thundering-herd mitigation over a [`Store`]. Values are written inside an
//! envelope carrying a herd expiry shorter than the store TTL. The first
//! reader to see an expired envelope gets a miss and is expected to recompute
//! the value; the bare payload is written back for `herd_timeout` seconds so
//! every other reader keeps getting a hit meanwhile.

mod batch;
mod cache;
pub mod envelope;
mod key;

#[cfg(test)]
mod testing;

pub use envelope::StoredValue;
pub use key::{KeyMaker, PrefixKeyMaker};

use crate::store::{Store, MAX_RELATIVE_TTL};

// == Public Constants ==
/// Default grace window in seconds
pub const DEFAULT_HERD_TIMEOUT: u64 = 60;

/// Default logical timeout in seconds when the caller does not give one
pub const DEFAULT_TIMEOUT: u64 = 300;

// == Herd Settings ==
/// Timeouts shared by every operation of a [`HerdCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HerdSettings {
    /// Seconds a stale value is kept around after its herd expiry
    pub herd_timeout: u64,
    /// Logical timeout used when the caller passes `None`
    pub default_timeout: u64,
}

impl Default for HerdSettings {
    fn default() -> Self {
        Self {
            herd_timeout: DEFAULT_HERD_TIMEOUT,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

// == Herd Cache ==
/// Herd-protected cache over a store and a key-naming scheme.
///
/// Timeouts are `Option<u64>` seconds:
/// - `None` uses [`HerdSettings::default_timeout`] and is still herd-wrapped;
/// - `Some(0)` is passed to the store as `0` (its own default) unwrapped;
/// - `Some(n)` expires after `n` seconds.
///
/// Holds no mutable state, so it can be shared freely behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HerdCache<S, K = PrefixKeyMaker> {
    store: S,
    keys: K,
    settings: HerdSettings,
}

impl<S: Store, K: KeyMaker> HerdCache<S, K> {
    pub fn new(store: S, keys: K, settings: HerdSettings) -> Self {
        Self {
            store,
            keys,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> HerdSettings {
        self.settings
    }

    /// Whether a write with this timeout carries an envelope.
    fn wraps(&self, timeout: Option<u64>, herd: bool) -> bool {
        herd && timeout != Some(0)
    }

    fn effective_timeout(&self, timeout: Option<u64>) -> u64 {
        match timeout {
            Some(t) if t > 0 => t,
            _ => self.settings.default_timeout,
        }
    }

    /// TTL handed to the store for a write with this timeout.
    fn store_ttl(&self, timeout: Option<u64>, herd: bool) -> u64 {
        let ttl = if self.wraps(timeout, herd) {
            self.effective_timeout(timeout)
                .saturating_add(self.settings.herd_timeout)
        } else {
            timeout.unwrap_or(self.settings.default_timeout)
        };
        store_ttl_at(ttl, envelope::now_secs())
    }

    /// TTL for holding a bare stale payload while it is recomputed.
    fn hold_ttl(&self) -> u64 {
        store_ttl_at(self.settings.herd_timeout, envelope::now_secs())
    }

    /// Bytes to store for `value`, packed when herd protection applies.
    fn encode(&self, value: &[u8], timeout: Option<u64>, herd: bool) -> Vec<u8> {
        if self.wraps(timeout, herd) {
            let (packed, _) = envelope::pack(
                value,
                self.effective_timeout(timeout),
                self.settings.herd_timeout,
            );
            packed
        } else {
            value.to_vec()
        }
    }
}

// == TTL Normalisation ==
/// Converts a relative TTL into the store's memcached convention.
///
/// Relative TTLs past [`MAX_RELATIVE_TTL`] would be read by the store as an
/// absolute timestamp, so they are sent as `now + ttl` instead. `0` and
/// shorter TTLs pass through unchanged.
pub(crate) fn store_ttl_at(ttl: u64, now: i64) -> u64 {
    if ttl > MAX_RELATIVE_TTL {
        u64::try_from(now).unwrap_or(0).saturating_add(ttl)
    } else {
        ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache(settings: HerdSettings) -> HerdCache<MemoryStore> {
        HerdCache::new(MemoryStore::new(100, 300), PrefixKeyMaker::default(), settings)
    }

    #[test]
    fn test_default_settings() {
        let settings = HerdSettings::default();
        assert_eq!(settings.herd_timeout, 60);
        assert_eq!(settings.default_timeout, 300);
    }

    #[test]
    fn test_store_ttl_rules() {
        let cache = cache(HerdSettings {
            herd_timeout: 60,
            default_timeout: 120,
        });

        assert_eq!(cache.store_ttl(Some(30), true), 90);
        assert_eq!(cache.store_ttl(None, true), 180);
        assert_eq!(cache.store_ttl(Some(0), true), 0);
        assert_eq!(cache.store_ttl(Some(30), false), 30);
        assert_eq!(cache.store_ttl(None, false), 120);
        assert_eq!(cache.store_ttl(Some(0), false), 0);
    }

    #[test]
    fn test_store_ttl_at_converts_long_ttls_to_timestamps() {
        let now = 1_700_000_000;

        assert_eq!(store_ttl_at(0, now), 0);
        assert_eq!(store_ttl_at(90, now), 90);
        assert_eq!(store_ttl_at(MAX_RELATIVE_TTL, now), MAX_RELATIVE_TTL);
        assert_eq!(
            store_ttl_at(MAX_RELATIVE_TTL + 1, now),
            1_700_000_000 + MAX_RELATIVE_TTL + 1
        );
    }

    #[test]
    fn test_store_ttl_past_thirty_days_is_absolute() {
        let cache = cache(HerdSettings::default());
        let before = u64::try_from(envelope::now_secs()).unwrap();

        let ttl = cache.store_ttl(Some(MAX_RELATIVE_TTL), true);
        let after = u64::try_from(envelope::now_secs()).unwrap();

        let relative = MAX_RELATIVE_TTL + 60;
        assert!((before + relative..=after + relative).contains(&ttl));
        assert_eq!(cache.store_ttl(Some(MAX_RELATIVE_TTL - 60), true), MAX_RELATIVE_TTL);
    }

    #[test]
    fn test_hold_ttl_normalises_long_herd_timeouts() {
        let short = cache(HerdSettings::default());
        assert_eq!(short.hold_ttl(), 60);

        let long = cache(HerdSettings {
            herd_timeout: MAX_RELATIVE_TTL + 1,
            default_timeout: 300,
        });
        assert!(long.hold_ttl() > MAX_RELATIVE_TTL * 2);
    }

    #[test]
    fn test_encode_wraps_only_when_herd_applies() {
        let cache = cache(HerdSettings::default());

        assert!(matches!(
            StoredValue::decode(cache.encode(b"v", Some(30), true)),
            StoredValue::Envelope { .. }
        ));
        assert!(matches!(
            StoredValue::decode(cache.encode(b"v", None, true)),
            StoredValue::Envelope { .. }
        ));
        assert_eq!(cache.encode(b"v", Some(0), true), b"v");
        assert_eq!(cache.encode(b"v", Some(30), false), b"v");
    }
}
