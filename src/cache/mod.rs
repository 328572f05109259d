//! Cache Module
//!
//! Generic cache engine with TTL expiration, LRU eviction, version tagging
//! and pluggable storage backends.

mod backend;
mod engine;
mod entry;
mod lru;
pub mod serde_hex;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{
    hash_key, BackendKind, DurableBackend, MemoryBackend, SessionBackend, SessionStorage,
    StorageBackend,
};
pub use engine::{CacheEngine, EngineConfig};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized entry size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
