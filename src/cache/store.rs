//! Cache Store Module
//!
//! In-memory index of an engine: HashMap storage with LRU tracking,
//! TTL/version liveness and running aggregates.

use std::collections::HashMap;

use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, LruTracker};

// == Lookup ==
/// Outcome of a counted read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Live entry; the value is a copy
    Hit(V),
    /// No entry under the key
    Miss,
    /// Entry existed but was expired or from another version; it has been removed
    Stale,
}

impl<V> Lookup<V> {
    pub fn into_option(self) -> Option<V> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Stale => None,
        }
    }
}

// == Cache Store ==
/// Cache storage with LRU eviction, TTL expiry and version tagging.
///
/// `stats.entry_count` and `stats.total_bytes` always equal the sums over
/// `entries` after each mutating call.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics and aggregates
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Version live entries must carry
    version: String,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store. A zero capacity is raised to one.
    pub fn new(max_entries: usize, version: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Purge Expired ==
    /// Removes every expired or version-mismatched entry, returning their keys.
    pub fn purge_expired(&mut self) -> Vec<String> {
        let now = current_timestamp_ms();
        let stale: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now) || entry.version != self.version)
            .map(|entry| entry.key.clone())
            .collect();

        for key in &stale {
            self.remove(key);
        }
        stale
    }

    // == Make Room ==
    /// Evicts least recently used entries until one more fits.
    ///
    /// Returns the evicted keys, oldest first.
    pub fn make_room(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.entries.len() >= self.max_entries {
            let Some(key) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.stats.remove_entry(entry.size_bytes);
                self.stats.record_eviction();
                evicted.push(key);
            }
        }
        evicted
    }

    // == Insert ==
    /// Stores an entry as most recently used.
    ///
    /// An existing entry under the same key is replaced; callers run
    /// `purge_expired` and `make_room` first so the bound holds.
    pub fn insert(&mut self, entry: CacheEntry<V>) {
        let key = entry.key.clone();
        if let Some(old) = self.entries.remove(&key) {
            self.stats.remove_entry(old.size_bytes);
        }
        self.stats.add_entry(entry.size_bytes);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
    }

    // == Get ==
    /// Counted read: hits refresh recency, stale entries are dropped.
    pub fn get(&mut self, key: &str) -> Lookup<V> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return Lookup::Miss;
        };

        if entry.is_expired() || entry.version != self.version {
            self.remove(key);
            self.stats.record_miss();
            return Lookup::Stale;
        }

        entry.touch();
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Lookup::Hit(value)
    }

    /// Uncounted liveness check.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.is_live(&self.version))
            .unwrap_or(false)
    }

    // == Remove ==
    /// Removes an entry by key, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.stats.remove_entry(entry.size_bytes);
        Some(entry)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.reset_entries();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.lru.oldest_first().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
