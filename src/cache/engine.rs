//! Cache Engine Module
//!
//! Async facade over a [`CacheStore`] plus a pluggable [`StorageBackend`].
//! Each public operation holds the instance lock for its whole duration,
//! so a mutation completes before any other call on the same engine
//! observes the store.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{
    BackendKind, CacheEntry, CacheStats, CacheStore, Lookup, StorageBackend, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

// == Engine Config ==
/// Per-instance engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Instance name, used in logs and as storage namespace
    pub name: String,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Upper bound on live entries
    pub max_entries: usize,
    /// Entries carrying any other version are treated as absent
    pub version: String,
    /// Serialized size limit per entry; `None` leaves only the backend quota
    pub max_value_bytes: Option<u64>,
}

impl EngineConfig {
    pub fn new(name: impl Into<String>, default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            default_ttl,
            max_entries,
            version: "1.0.0".to_string(),
            max_value_bytes: Some(MAX_VALUE_SIZE as u64),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_max_value_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_value_bytes = limit;
        self
    }
}

// == Cache Engine ==
/// Generic key -> value cache with TTL, LRU eviction and version tagging.
pub struct CacheEngine<V> {
    config: EngineConfig,
    store: Mutex<CacheStore<V>>,
    backend: Arc<dyn StorageBackend>,
}

impl<V> CacheEngine<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    // == Constructors ==
    /// Creates an empty engine without reading the backend.
    pub fn new(config: EngineConfig, backend: Arc<dyn StorageBackend>) -> Self {
        let store = CacheStore::new(config.max_entries, config.version.clone());
        Self {
            config,
            store: Mutex::new(store),
            backend,
        }
    }

    /// Creates an engine and loads the live entries its backend still holds.
    ///
    /// Expired, version-mismatched and undecodable payloads are dropped;
    /// the remaining entries are admitted oldest access first, so the
    /// capacity bound keeps the most recently used ones.
    pub async fn open(config: EngineConfig, backend: Arc<dyn StorageBackend>) -> Self {
        let engine = Self::new(config, backend);
        engine.hydrate().await;
        engine
    }

    async fn hydrate(&self) {
        let payloads = match self.backend.load_all().await {
            Ok(payloads) => payloads,
            Err(e) => {
                warn!("[{}] Could not read backend, starting empty: {}", self.config.name, e);
                return;
            }
        };

        let mut live = Vec::new();
        for payload in payloads {
            let entry: CacheEntry<V> = match serde_json::from_str(&payload) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("[{}] Skipping undecodable entry: {}", self.config.name, e);
                    continue;
                }
            };
            if entry.is_live(&self.config.version) {
                live.push(entry);
            } else {
                self.remove_persisted(&entry.key).await;
            }
        }
        live.sort_by_key(|entry| entry.last_accessed);

        let mut store = self.store.lock().await;
        let loaded = live.len();
        for entry in live {
            for evicted in store.make_room() {
                self.remove_persisted(&evicted).await;
            }
            store.insert(entry);
        }
        info!(
            "[{}] Hydrated {} entries from {:?} backend",
            self.config.name,
            loaded.min(store.len()),
            self.backend.kind()
        );
    }

    // == Set ==
    /// Inserts or overwrites an entry expiring `ttl` (or the default TTL) from now.
    ///
    /// Expired entries are purged and least recently used entries evicted
    /// before the insert. Backend failures are logged and the entry is
    /// kept in memory only; they never reach the caller.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(CacheError::InvalidRequest("TTL must be positive".to_string()));
        }

        let entry = CacheEntry::new(key.to_string(), value, ttl, &self.config.version)?;
        if let Some(limit) = self.config.max_value_bytes {
            if entry.size_bytes > limit {
                return Err(CacheError::InvalidRequest(format!(
                    "Value exceeds maximum size of {} bytes",
                    limit
                )));
            }
        }
        let payload = serde_json::to_string(&entry)?;

        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        // An overwrite frees its own slot
        store.remove(key);
        for evicted in store.make_room() {
            debug!("[{}] Evicted LRU entry: {}", self.config.name, evicted);
            self.remove_persisted(&evicted).await;
        }

        if let Err(e) = self.backend.write(key, &payload).await {
            warn!(
                "[{}] {:?} backend write failed for {}, keeping entry in memory: {}",
                self.config.name,
                self.backend.kind(),
                key,
                e
            );
            // A previously persisted copy would otherwise resurrect on the next open
            self.remove_persisted(key).await;
        }

        store.insert(entry);
        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value, or `None` on miss, expiry or version mismatch.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        match store.get(key) {
            Lookup::Hit(value) => {
                debug!("[{}] Cache hit: {}", self.config.name, key);
                Some(value)
            }
            Lookup::Miss => {
                debug!("[{}] Cache miss: {}", self.config.name, key);
                None
            }
            Lookup::Stale => {
                debug!("[{}] Stale entry dropped: {}", self.config.name, key);
                self.remove_persisted(key).await;
                None
            }
        }
    }

    /// Uncounted presence check for a live entry.
    pub async fn contains(&self, key: &str) -> bool {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.contains(key)
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.remove(key);
        self.remove_persisted(key).await;
    }

    // == Clear ==
    pub async fn clear(&self) {
        let mut store = self.store.lock().await;
        store.clear();
        if let Err(e) = self.backend.clear().await {
            warn!("[{}] Backend clear failed: {}", self.config.name, e);
        }
        info!("[{}] Cache cleared", self.config.name);
    }

    // == Stats ==
    /// Counters and totals over live entries only.
    pub async fn stats(&self) -> CacheStats {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.stats()
    }

    /// Live keys from least to most recently used.
    pub async fn keys(&self) -> Vec<String> {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.keys()
    }

    pub async fn len(&self) -> usize {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        let mut store = self.store.lock().await;
        self.purge(&mut store).await;
        store.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Drops every expired or version-mismatched entry, in memory and on the backend.
    async fn purge(&self, store: &mut CacheStore<V>) {
        for stale in store.purge_expired() {
            debug!("[{}] Purged expired entry: {}", self.config.name, stale);
            self.remove_persisted(&stale).await;
        }
    }

    async fn remove_persisted(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            warn!("[{}] Backend remove failed for {}: {}", self.config.name, key, e);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DurableBackend, MemoryBackend, SessionStorage};

    fn memory_engine(max_entries: usize) -> CacheEngine<String> {
        CacheEngine::new(
            EngineConfig::new("test", Duration::from_secs(300), max_entries),
            Arc::new(MemoryBackend),
        )
    }

    #[tokio::test]
    async fn test_set_then_get_returns_last_value() {
        let engine = memory_engine(10);
        engine.set("k", "one".to_string(), None).await.unwrap();
        engine.set("k", "two".to_string(), None).await.unwrap();

        assert_eq!(engine.get("k").await.as_deref(), Some("two"));
        assert_eq!(engine.stats().await.entry_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_counted() {
        let engine = memory_engine(10);
        engine
            .set("k", "v".to_string(), Some(Duration::from_millis(30)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(engine.get("k").await.is_none());
        let stats = engine.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_accessed() {
        let engine = memory_engine(3);
        for key in ["a", "b", "c"] {
            engine.set(key, key.to_string(), None).await.unwrap();
        }
        // Refresh a and b; c is now the least recently used
        engine.get("a").await;
        engine.get("b").await;

        engine.set("d", "d".to_string(), None).await.unwrap();

        assert_eq!(engine.len().await, 3);
        assert!(!engine.contains("c").await);
        for key in ["a", "b", "d"] {
            assert!(engine.contains(key).await, "{} should survive", key);
        }
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let engine = memory_engine(10);
        engine.set("k", "v".to_string(), None).await.unwrap();
        engine.get("k").await;
        engine.get("k").await;
        engine.get("k").await;
        engine.get("missing").await;

        let stats = engine.stats().await;
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.75);
    }

    #[tokio::test]
    async fn test_rejects_invalid_input() {
        let engine = memory_engine(10);
        assert!(matches!(
            engine.set("", "v".to_string(), None).await,
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(matches!(
            engine.set("k", "v".to_string(), Some(Duration::ZERO)).await,
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(matches!(
            engine
                .set(&"x".repeat(MAX_KEY_LENGTH + 1), "v".to_string(), None)
                .await,
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let engine = memory_engine(10);
        engine.set("a", "1".to_string(), None).await.unwrap();
        engine.set("b", "2".to_string(), None).await.unwrap();

        engine.delete("a").await;
        assert!(engine.get("a").await.is_none());
        assert_eq!(engine.stats().await.entry_count, 1);

        engine.clear().await;
        assert!(engine.is_empty().await);
        assert_eq!(engine.stats().await.total_bytes, 0);
    }

    #[tokio::test]
    async fn test_other_expired_entries_leave_totals() {
        let engine = memory_engine(10);
        engine
            .set("a", "short-lived".to_string(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        engine.set("b", "kept".to_string(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Touching only b still drops a
        assert_eq!(engine.get("b").await.as_deref(), Some("kept"));
        assert_eq!(engine.keys().await, vec!["b".to_string()]);
        assert_eq!(engine.stats().await.entry_count, 1);

        engine.delete("b").await;
        let stats = engine.stats().await;
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.total_bytes, 0);
        assert!(engine.keys().await.is_empty());
        assert!(engine.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_removed_from_backend_on_stats() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DurableBackend::open(dir.path(), 1 << 20).await.unwrap();
        let engine: CacheEngine<String> = CacheEngine::new(
            EngineConfig::new("static", Duration::from_secs(60), 10),
            Arc::new(backend.clone()),
        );
        engine
            .set("old", "v".to_string(), Some(Duration::from_millis(20)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.stats().await.entry_count, 0);
        assert!(backend.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_value_size_limit_is_per_engine() {
        let big = "x".repeat(MAX_VALUE_SIZE + 1);

        let bounded = memory_engine(10);
        assert!(matches!(
            bounded.set("big", big.clone(), None).await,
            Err(CacheError::InvalidRequest(_))
        ));

        let unbounded: CacheEngine<String> = CacheEngine::new(
            EngineConfig::new("static", Duration::from_secs(60), 10).with_max_value_bytes(None),
            Arc::new(MemoryBackend),
        );
        unbounded.set("big", big.clone(), None).await.unwrap();
        assert_eq!(unbounded.get("big").await, Some(big));
    }

    #[tokio::test]
    async fn test_durable_engine_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new("static", Duration::from_secs(60), 10);

        {
            let backend = DurableBackend::open(dir.path(), 1 << 20).await.unwrap();
            let engine: CacheEngine<String> = CacheEngine::open(config.clone(), Arc::new(backend)).await;
            engine.set("logo", "png-bytes".to_string(), None).await.unwrap();
        }

        let backend = DurableBackend::open(dir.path(), 1 << 20).await.unwrap();
        let engine: CacheEngine<String> = CacheEngine::open(config, Arc::new(backend)).await;
        assert_eq!(engine.get("logo").await.as_deref(), Some("png-bytes"));
    }

    #[tokio::test]
    async fn test_reopen_with_new_version_discards_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new("static", Duration::from_secs(60), 10);

        {
            let backend = DurableBackend::open(dir.path(), 1 << 20).await.unwrap();
            let engine: CacheEngine<String> = CacheEngine::open(config.clone(), Arc::new(backend)).await;
            engine.set("logo", "old".to_string(), None).await.unwrap();
        }

        let backend = DurableBackend::open(dir.path(), 1 << 20).await.unwrap();
        let engine: CacheEngine<String> =
            CacheEngine::open(config.with_version("2.0.0"), Arc::new(backend.clone())).await;
        assert!(engine.get("logo").await.is_none());
        assert!(backend.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_failure_falls_back_to_memory() {
        let storage = SessionStorage::new(8);
        let engine: CacheEngine<String> = CacheEngine::new(
            EngineConfig::new("user", Duration::from_secs(60), 10),
            Arc::new(storage.backend("user")),
        );

        // Too large for the 8-byte quota, but the call still succeeds
        engine.set("profile", "x".repeat(64), None).await.unwrap();

        assert_eq!(engine.get("profile").await, Some("x".repeat(64)));
        assert_eq!(storage.used_bytes().unwrap(), 0);
    }
}
