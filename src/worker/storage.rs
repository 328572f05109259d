//! Generation storage
//!
//! Named, versioned response buckets owned by the worker. Shared by every
//! worker version so that an activating worker can delete its
//! predecessors' generations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::cache::hash_key;
use crate::client::HttpResponse;
use crate::error::{CacheError, Result};

// == Generation Storage Trait ==
#[async_trait]
pub trait GenerationStorage: Send + Sync {
    /// Creates the generation if it does not exist yet.
    async fn open(&self, name: &str) -> Result<()>;

    /// Names of every existing generation, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Deletes a generation and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    async fn match_request(&self, name: &str, key: &str) -> Result<Option<HttpResponse>>;

    /// First match across all generations, oldest generation first.
    async fn match_any(&self, key: &str) -> Result<Option<HttpResponse>> {
        for name in self.keys().await? {
            if let Some(response) = self.match_request(&name, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Stores `response` under `key`, opening the generation if needed.
    async fn put(&self, name: &str, key: &str, response: &HttpResponse) -> Result<()>;
}

// == Memory Generations ==
#[derive(Debug, Default)]
pub struct MemoryGenerations {
    generations: RwLock<Vec<(String, HashMap<String, HttpResponse>)>>,
}

impl MemoryGenerations {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenerationStorage for MemoryGenerations {
    async fn open(&self, name: &str) -> Result<()> {
        let mut generations = self.generations.write().await;
        if !generations.iter().any(|(n, _)| n == name) {
            generations.push((name.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|(n, _)| n != name);
        Ok(generations.len() != before)
    }

    async fn match_request(&self, name: &str, key: &str) -> Result<Option<HttpResponse>> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, responses)| responses.get(key).cloned()))
    }

    async fn put(&self, name: &str, key: &str, response: &HttpResponse) -> Result<()> {
        let mut generations = self.generations.write().await;
        match generations.iter_mut().find(|(n, _)| n == name) {
            Some((_, responses)) => {
                responses.insert(key.to_string(), response.clone());
            }
            None => {
                let mut responses = HashMap::new();
                responses.insert(key.to_string(), response.clone());
                generations.push((name.to_string(), responses));
            }
        }
        Ok(())
    }
}

// == Disk Generations ==
/// Directory per generation, JSON file per stored request.
#[derive(Debug, Clone)]
pub struct DiskGenerations {
    root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct StoredResponse {
    key: String,
    response: HttpResponse,
}

impl DiskGenerations {
    pub async fn open_root(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn generation_dir(&self, name: &str) -> Result<PathBuf> {
        let path_like = name.contains(|c: char| c == '/' || c == '\\');
        if name.is_empty() || path_like || name.starts_with('.') {
            return Err(CacheError::InvalidRequest(format!(
                "Invalid generation name: {:?}",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    fn entry_path(&self, name: &str, key: &str) -> Result<PathBuf> {
        Ok(self
            .generation_dir(name)?
            .join(format!("{}.json", hash_key(key))))
    }
}

#[async_trait]
impl GenerationStorage for DiskGenerations {
    async fn open(&self, name: &str) -> Result<()> {
        fs::create_dir_all(self.generation_dir(name)?).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            if item.file_type().await?.is_dir() {
                names.push((item.metadata().await?.created().ok(), item.file_name()));
            }
        }
        // Creation time where the filesystem records it, name otherwise
        names.sort();
        Ok(names
            .into_iter()
            .filter_map(|(_, name)| name.into_string().ok())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.generation_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_request(&self, name: &str, key: &str) -> Result<Option<HttpResponse>> {
        let path = self.entry_path(name, key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => {
                let stored: StoredResponse = serde_json::from_str(&raw)?;
                Ok((stored.key == key).then_some(stored.response))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, name: &str, key: &str, response: &HttpResponse) -> Result<()> {
        self.open(name).await?;
        let path = self.entry_path(name, key)?;
        let stored = StoredResponse {
            key: key.to_string(),
            response: response.clone(),
        };
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(&stored)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
