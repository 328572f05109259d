//! Storage Backends
//!
//! Persistence layers an engine writes through to. The engine keeps its
//! own in-memory index; a backend only has to store serialized entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::{CacheError, Result};

// == Backend Kind ==
/// Which persistence an engine instance is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Entries live only in the engine's memory
    Memory,
    /// Entries survive process restarts
    Durable,
    /// Entries live as long as the session storage handle
    Session,
}

// == Storage Backend Trait ==
/// Key -> serialized entry persistence.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Store a serialized entry, replacing any previous one.
    async fn write(&self, key: &str, payload: &str) -> Result<()>;

    /// Read a serialized entry.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    async fn remove(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Every stored payload, used to hydrate an engine on open.
    async fn load_all(&self) -> Result<Vec<String>>;
}

// == Memory Backend ==
/// No persistence: the engine's index is the only copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn write(&self, _key: &str, _payload: &str) -> Result<()> {
        Ok(())
    }

    async fn read(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

// == Durable Backend ==
/// One JSON file per key under a directory, bounded by a byte quota.
#[derive(Debug, Clone)]
pub struct DurableBackend {
    dir: PathBuf,
    quota_bytes: u64,
}

impl DurableBackend {
    /// Opens (creating if needed) the backend directory.
    pub async fn open(dir: impl AsRef<Path>, quota_bytes: u64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, quota_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_key(key)))
    }

    /// Bytes currently on disk, excluding `skip`.
    async fn used_bytes(&self, skip: &Path) -> Result<u64> {
        let mut total = 0;
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            if item.path() == skip {
                continue;
            }
            total += item.metadata().await?.len();
        }
        Ok(total)
    }
}

#[async_trait]
impl StorageBackend for DurableBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Durable
    }

    async fn write(&self, key: &str, payload: &str) -> Result<()> {
        let path = self.path_for(key);
        let used = self.used_bytes(&path).await?;
        if used + payload.len() as u64 > self.quota_bytes {
            return Err(CacheError::QuotaExceeded(format!(
                "{} of {} bytes used, {} more requested",
                used,
                self.quota_bytes,
                payload.len()
            )));
        }

        // Write to a sibling temp file first so a crash never leaves half an entry
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            if item.file_type().await?.is_file() {
                fs::remove_file(item.path()).await?;
            }
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<String>> {
        let mut payloads = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                payloads.push(fs::read_to_string(&path).await?);
            }
        }
        Ok(payloads)
    }
}

// == Session Storage ==
/// Process-lifetime key/value area shared by every session-scoped engine.
///
/// Clones share the same underlying map and quota.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: u64,
}

impl SessionStorage {
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            quota_bytes,
        }
    }

    /// Backend writing under `cache_<namespace>_` keys.
    pub fn backend(&self, namespace: &str) -> SessionBackend {
        SessionBackend {
            storage: self.clone(),
            prefix: format!("cache_{}_", namespace),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| CacheError::Storage(format!("session storage lock poisoned: {}", e)))
    }

    pub fn used_bytes(&self) -> Result<u64> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum())
    }
}

// == Session Backend ==
/// Namespaced view over a [`SessionStorage`].
#[derive(Debug, Clone)]
pub struct SessionBackend {
    storage: SessionStorage,
    prefix: String,
}

impl SessionBackend {
    fn item_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl StorageBackend for SessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Session
    }

    async fn write(&self, key: &str, payload: &str) -> Result<()> {
        let item_key = self.item_key(key);
        let mut items = self.storage.lock()?;

        let used: u64 = items
            .iter()
            .filter(|(k, _)| **k != item_key)
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();
        let needed = (item_key.len() + payload.len()) as u64;
        if used + needed > self.storage.quota_bytes {
            return Err(CacheError::QuotaExceeded(format!(
                "{} of {} bytes used, {} more requested",
                used, self.storage.quota_bytes, needed
            )));
        }

        items.insert(item_key, payload.to_string());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.storage.lock()?.get(&self.item_key(key)).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.storage.lock()?.remove(&self.item_key(key));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.storage
            .lock()?
            .retain(|k, _| !k.starts_with(&self.prefix));
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .lock()?
            .iter()
            .filter(|(k, _)| k.starts_with(&self.prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }
}

// == Utility Functions ==
/// Stable file-system-safe digest of a key.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
