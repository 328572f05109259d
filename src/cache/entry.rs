//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and version support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Entries are owned by the engine; readers only ever receive clones of `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), always > created_at
    pub expires_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed: u64,
    /// Engine version the entry was written under
    pub version: String,
    /// Size of the JSON encoding of the entry in bytes
    pub size_bytes: u64,
}

impl<V: Serialize> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// The caller guarantees `ttl` is non-zero so that `expires_at > created_at`.
    pub fn new(key: String, value: V, ttl: Duration, version: &str) -> Result<Self, serde_json::Error> {
        let now = current_timestamp_ms();
        let ttl_ms = (ttl.as_millis() as u64).max(1);

        let mut entry = Self {
            key,
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            last_accessed: now,
            version: version.to_string(),
            size_bytes: 0,
        };
        entry.size_bytes = serde_json::to_vec(&entry)?.len() as u64;
        Ok(entry)
    }
}

impl<V> CacheEntry<V> {
    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Is Live ==
    /// True when the entry is neither expired nor from another version.
    pub fn is_live(&self, version: &str) -> bool {
        !self.is_expired() && self.version == version
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds (0 once expired).
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Records an access for recency bookkeeping.
    pub fn touch(&mut self) {
        self.last_accessed = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
