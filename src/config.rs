//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::herd::{HerdSettings, DEFAULT_HERD_TIMEOUT, DEFAULT_TIMEOUT};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the memory store can hold
    pub max_entries: usize,
    /// Logical timeout in seconds for writes that do not give one
    pub default_timeout: u64,
    /// Grace window in seconds a herd-stale value is held for
    pub herd_timeout: u64,
    /// Prefix for physical keys
    pub key_prefix: String,
    /// Key version used when a request does not give one
    pub key_version: u32,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum store entries (default: 1000)
    /// - `DEFAULT_TIMEOUT` - Default logical timeout in seconds (default: 300)
    /// - `HERD_TIMEOUT` - Herd grace window in seconds (default: 60)
    /// - `KEY_PREFIX` - Physical key prefix (default: empty)
    /// - `KEY_VERSION` - Default key version (default: 1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_timeout: env_or("DEFAULT_TIMEOUT", defaults.default_timeout),
            herd_timeout: env_or("HERD_TIMEOUT", defaults.herd_timeout),
            key_prefix: env::var("KEY_PREFIX").unwrap_or(defaults.key_prefix),
            key_version: env_or("KEY_VERSION", defaults.key_version),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("MAX_ENTRIES", self.max_entries as u64),
            ("DEFAULT_TIMEOUT", self.default_timeout),
            ("HERD_TIMEOUT", self.herd_timeout),
            ("CLEANUP_INTERVAL", self.cleanup_interval),
        ];

        match nonzero.into_iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Zero { name }),
            None => Ok(()),
        }
    }

    /// Timeouts for the herd layer.
    pub fn herd_settings(&self) -> HerdSettings {
        HerdSettings {
            herd_timeout: self.herd_timeout,
            default_timeout: self.default_timeout,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_timeout: DEFAULT_TIMEOUT,
            herd_timeout: DEFAULT_HERD_TIMEOUT,
            key_prefix: String::new(),
            key_version: 1,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
