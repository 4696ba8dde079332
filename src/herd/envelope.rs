//! Value Envelope Module
//!
//! Wire format for herd-protected values. A packed value is
//!
//! ```text
//! MARKER (8 bytes) | herd_expiry (i64 big-endian, Unix seconds) | payload
//! ```
//!
//! Anything that does not start with the marker and a full expiry field is a
//! bare value and decodes as [`StoredValue::Raw`].

use chrono::Utc;

/// Magic prefix tagging a herd envelope.
pub const MARKER: [u8; 8] = *b"\xffHERD\x00\x01\xfe";

/// Bytes preceding the payload in an envelope.
pub const HEADER_LEN: usize = MARKER.len() + 8;

// == Stored Value ==
/// Decoded form of bytes read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// A packed value with its herd expiry (Unix seconds)
    Envelope { payload: Vec<u8>, herd_expiry: i64 },
    /// A bare value written without herd metadata
    Raw(Vec<u8>),
}

impl StoredValue {
    // == Decode ==
    /// Decodes stored bytes. Never fails: unrecognized bytes are `Raw`.
    pub fn decode(bytes: Vec<u8>) -> Self {
        if bytes.len() < HEADER_LEN || bytes[..MARKER.len()] != MARKER {
            return StoredValue::Raw(bytes);
        }

        let mut expiry = [0u8; 8];
        expiry.copy_from_slice(&bytes[MARKER.len()..HEADER_LEN]);

        StoredValue::Envelope {
            payload: bytes[HEADER_LEN..].to_vec(),
            herd_expiry: i64::from_be_bytes(expiry),
        }
    }

    // == Encode ==
    pub fn encode(&self) -> Vec<u8> {
        match self {
            StoredValue::Envelope {
                payload,
                herd_expiry,
            } => {
                let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
                out.extend_from_slice(&MARKER);
                out.extend_from_slice(&herd_expiry.to_be_bytes());
                out.extend_from_slice(payload);
                out
            }
            StoredValue::Raw(bytes) => bytes.clone(),
        }
    }

    // == Refresh Decision ==
    /// Splits into the caller-visible value and whether it is herd-stale.
    ///
    /// An envelope is stale once `now >= herd_expiry`; raw values never are.
    pub fn into_parts(self, now: i64) -> (Vec<u8>, bool) {
        match self {
            StoredValue::Envelope {
                payload,
                herd_expiry,
            } => (payload, now >= herd_expiry),
            StoredValue::Raw(bytes) => (bytes, false),
        }
    }
}

// == Pack / Unpack ==
/// Wraps `value` in an envelope expiring `timeout` seconds after `now`.
///
/// Returns the encoded envelope and the store TTL, which outlives the herd
/// expiry by `herd_timeout` seconds.
pub fn pack_at(value: &[u8], timeout: u64, herd_timeout: u64, now: i64) -> (Vec<u8>, u64) {
    let herd_expiry = now.saturating_add(i64::try_from(timeout).unwrap_or(i64::MAX));
    let envelope = StoredValue::Envelope {
        payload: value.to_vec(),
        herd_expiry,
    };

    (envelope.encode(), timeout.saturating_add(herd_timeout))
}

/// [`pack_at`] against the system clock.
pub fn pack(value: &[u8], timeout: u64, herd_timeout: u64) -> (Vec<u8>, u64) {
    pack_at(value, timeout, herd_timeout, now_secs())
}

/// Decodes stored bytes into `(value, refresh)` as seen at `now`.
pub fn unpack_at(stored: Vec<u8>, now: i64) -> (Vec<u8>, bool) {
    StoredValue::decode(stored).into_parts(now)
}

/// [`unpack_at`] against the system clock.
pub fn unpack(stored: Vec<u8>) -> (Vec<u8>, bool) {
    unpack_at(stored, now_secs())
}

/// Current Unix time in whole seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}
