//! Key naming
//!
//! Maps logical keys and an optional version onto physical store keys.

/// Translates a logical key into the physical key used by the store.
///
/// Implementations must be deterministic and injective: two different
/// `(key, version)` pairs never produce the same physical key.
pub trait KeyMaker: Send + Sync {
    fn make_key(&self, key: &str, version: Option<u32>) -> String;
}

// == Prefix Key Maker ==
/// Builds `prefix:version:key`, falling back to a configured version.
#[derive(Debug, Clone)]
pub struct PrefixKeyMaker {
    prefix: String,
    version: u32,
}

impl PrefixKeyMaker {
    pub fn new(prefix: impl Into<String>, version: u32) -> Self {
        Self {
            prefix: prefix.into(),
            version,
        }
    }
}

impl Default for PrefixKeyMaker {
    fn default() -> Self {
        Self::new("", 1)
    }
}

impl KeyMaker for PrefixKeyMaker {
    fn make_key(&self, key: &str, version: Option<u32>) -> String {
        format!(
            "{}:{}:{}",
            self.prefix,
            version.unwrap_or(self.version),
            key
        )
    }
}

impl<F> KeyMaker for F
where
    F: Fn(&str, Option<u32>) -> String + Send + Sync,
{
    fn make_key(&self, key: &str, version: Option<u32>) -> String {
        self(key, version)
    }
}
