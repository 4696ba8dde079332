//! Herd Cache - thundering-herd mitigation for memcached-style caches
//!
//! Values are stored with an embedded expiry shorter than their store TTL.
//! When that expiry passes, one reader gets a miss and recomputes the value
//! while the others keep being served the old one for a short grace window.

pub mod api;
pub mod config;
pub mod error;
pub mod herd;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use herd::{HerdCache, HerdSettings, KeyMaker, PrefixKeyMaker};
pub use store::{MemoryStore, Store};
pub use tasks::spawn_cleanup_task;
