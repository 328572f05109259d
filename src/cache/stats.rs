//! Cache Statistics Module
//!
//! Tracks cache performance metrics and the live-entry aggregates.

use serde::Serialize;

// == Cache Stats ==
/// Hit/miss counters plus running totals over live entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or stale version)
    pub misses: u64,
    /// hits / (hits + misses), 0 when nothing was requested
    pub hit_rate: f64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Current number of live entries
    pub entry_count: usize,
    /// Sum of `size_bytes` over live entries
    pub total_bytes: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Aggregates ==
    /// Accounts for an entry entering the live set.
    pub fn add_entry(&mut self, size_bytes: u64) {
        self.entry_count += 1;
        self.total_bytes += size_bytes;
    }

    /// Accounts for an entry leaving the live set.
    pub fn remove_entry(&mut self, size_bytes: u64) {
        self.entry_count = self.entry_count.saturating_sub(1);
        self.total_bytes = self.total_bytes.saturating_sub(size_bytes);
    }

    pub fn reset_entries(&mut self) {
        self.entry_count = 0;
        self.total_bytes = 0;
    }

    /// Copy with `hit_rate` filled in, as handed to callers.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hit_rate: self.hit_rate(),
            ..self.clone()
        }
    }
}
