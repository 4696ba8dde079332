//! Store Entry Module
//!
//! Defines the structure for individual stored items and memcached-style
//! expiration handling.

use chrono::Utc;

/// Relative TTLs above this many seconds are read as absolute Unix timestamps,
/// as memcached does.
pub const MAX_RELATIVE_TTL: u64 = 60 * 60 * 24 * 30;

// == Store Entry ==
/// A single stored item: opaque bytes plus expiry metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored bytes
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry expiring according to a memcached-style TTL.
    ///
    /// # Arguments
    /// * `value` - The bytes to store
    /// * `ttl` - TTL in seconds; `0` means "use `default_ttl`"
    /// * `default_ttl` - Fallback TTL; `0` means "never expire"
    pub fn new(value: Vec<u8>, ttl: u64, default_ttl: u64) -> Self {
        let now = current_timestamp_ms();

        Self {
            value,
            created_at: now,
            expires_at: resolve_expiry(ttl, default_ttl, now),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    /// Returns remaining TTL in whole seconds, rounded up.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| ms.div_ceil(1000))
    }
}

// == Utility Functions ==
/// Converts a memcached-style TTL into an absolute expiry in milliseconds.
///
/// `0` falls back to `default_ttl` (and `0` there means no expiry). Values up
/// to [`MAX_RELATIVE_TTL`] are relative seconds; anything larger is an
/// absolute Unix timestamp in seconds. The herd layer converts its own long
/// relative TTLs before calling the store, so that branch is only taken for
/// callers that pass an absolute time on purpose.
pub fn resolve_expiry(ttl: u64, default_ttl: u64, now_ms: u64) -> Option<u64> {
    let ttl = if ttl == 0 { default_ttl } else { ttl };

    match ttl {
        0 => None,
        t if t > MAX_RELATIVE_TTL => Some(t.saturating_mul(1000)),
        t => Some(now_ms.saturating_add(t.saturating_mul(1000))),
    }
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
