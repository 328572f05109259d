//! Asset Preloader
//!
//! Fetches binary assets ahead of need into the static-asset cache,
//! starting with a declared critical set.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assets::AssetRecord;
use crate::cache::{CacheEngine, CacheStats};
use crate::client::{CachePolicy, ClientConfig, RequestDescriptor, RequestOptions, Transport};
use crate::error::{CacheError, Result};

/// Assets every dashboard page needs on first paint.
pub const DEFAULT_CRITICAL_ASSETS: [&str; 5] = [
    "/images/logo/logo.png",
    "/images/logo/vinod-cv-logo.svg",
    "/images/user/owner.jpg",
    "/images/shape/grid-01.svg",
    "/favicon.ico",
];

// == Preload Config ==
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Prefix for relative asset URLs
    pub base_url: String,
    /// How long fetched assets stay cached
    pub ttl: Duration,
    /// Limit per asset fetch
    pub timeout: Duration,
    /// When false, `preload_critical` is a no-op
    pub preload_critical: bool,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            timeout: Duration::from_secs(10),
            preload_critical: true,
        }
    }
}

// == Preload Outcome ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreloadStatus {
    Loaded { size_bytes: u64 },
    Failed { reason: String },
}

/// Per-URL result of a batch preload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadOutcome {
    pub url: String,
    #[serde(flatten)]
    pub status: PreloadStatus,
}

impl PreloadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, PreloadStatus::Loaded { .. })
    }
}

// == Asset Preloader ==
pub struct AssetPreloader {
    config: PreloadConfig,
    cache: Arc<CacheEngine<AssetRecord>>,
    transport: Arc<dyn Transport>,
    /// Registered critical URLs in registration order
    critical: RwLock<Vec<String>>,
}

impl AssetPreloader {
    pub fn new(
        config: PreloadConfig,
        cache: Arc<CacheEngine<AssetRecord>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            cache,
            transport,
            critical: RwLock::new(Vec::new()),
        }
    }

    /// Preloader with [`DEFAULT_CRITICAL_ASSETS`] registered.
    pub fn with_default_assets(
        config: PreloadConfig,
        cache: Arc<CacheEngine<AssetRecord>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let preloader = Self::new(config, cache, transport);
        for url in DEFAULT_CRITICAL_ASSETS {
            preloader.register(url);
        }
        preloader
    }

    // == Critical Set ==
    /// Marks a URL as critical. Registering twice has no effect.
    pub fn register(&self, url: &str) {
        let mut critical = self.critical.write().unwrap_or_else(|e| e.into_inner());
        if !critical.iter().any(|u| u == url) {
            critical.push(url.to_string());
        }
    }

    pub fn unregister(&self, url: &str) {
        self.critical
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|u| u != url);
    }

    pub fn critical_assets(&self) -> Vec<String> {
        self.critical
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // == Cache Asset ==
    /// Fetches one asset and stores it, replacing any previous record.
    pub async fn cache_asset(&self, url: &str) -> Result<AssetRecord> {
        let client_config = ClientConfig {
            base_url: self.config.base_url.clone(),
            headers: Default::default(),
            cache_policy: CachePolicy::Disabled,
            timeout: self.config.timeout,
            ..ClientConfig::default()
        };
        let descriptor = RequestDescriptor::resolve(&client_config, url, RequestOptions::new());

        let response = tokio::time::timeout(descriptor.timeout, self.transport.send(&descriptor))
            .await
            .map_err(|_| CacheError::Timeout(descriptor.timeout.as_millis() as u64))??;
        if !response.is_success() {
            return Err(CacheError::HttpStatus {
                status: response.status,
                reason: format!("Failed to fetch asset {}", url),
            });
        }

        let record = AssetRecord::new(url, response.body);
        self.cache
            .set(url, record.clone(), Some(self.config.ttl))
            .await?;
        debug!(
            "[AssetCache] Cached: {} ({})",
            url,
            format_size(record.size_bytes)
        );
        Ok(record)
    }

    // == Get ==
    /// Cached payload for `url`, if present and live.
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.cache.get(url).await.map(|record| record.payload)
    }

    pub async fn record(&self, url: &str) -> Option<AssetRecord> {
        self.cache.get(url).await
    }

    // == Preload Critical ==
    /// Fetches every critical URL concurrently. One failure never aborts
    /// the batch; outcomes come back in registration order.
    pub async fn preload_critical(&self) -> Vec<PreloadOutcome> {
        if !self.config.preload_critical {
            return Vec::new();
        }

        let urls = self.critical_assets();
        info!("[AssetCache] Preloading {} critical assets", urls.len());

        let outcomes = join_all(urls.iter().map(|url| async move {
            let status = match self.cache_asset(url).await {
                Ok(record) => PreloadStatus::Loaded {
                    size_bytes: record.size_bytes,
                },
                Err(e) => {
                    warn!("[AssetCache] Failed to preload critical asset {}: {}", url, e);
                    PreloadStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            PreloadOutcome {
                url: url.clone(),
                status,
            }
        }))
        .await;

        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        info!(
            "[AssetCache] Critical assets preloaded: {}/{}",
            loaded,
            outcomes.len()
        );
        outcomes
    }

    // == Preload Image ==
    /// Tries each format variant of an image (`"original"` is the URL itself).
    /// Variant failures are expected and only logged at debug level.
    pub async fn preload_image(&self, url: &str, formats: &[&str]) -> Vec<PreloadOutcome> {
        let variants: Vec<String> = formats
            .iter()
            .map(|format| variant_url(url, format))
            .collect();

        join_all(variants.into_iter().map(|variant| async move {
            let status = match self.cache_asset(&variant).await {
                Ok(record) => PreloadStatus::Loaded {
                    size_bytes: record.size_bytes,
                },
                Err(e) => {
                    debug!("[AssetCache] Variant not preloaded {}: {}", variant, e);
                    PreloadStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            PreloadOutcome {
                url: variant,
                status,
            }
        }))
        .await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
        info!("[AssetCache] Cache cleared");
    }
}

// == Utility Functions ==
/// Swaps the extension of `url` for `format`; `"original"` keeps it.
pub fn variant_url(url: &str, format: &str) -> String {
    if format == "original" {
        return url.to_string();
    }
    let file_start = url.rfind('/').map(|i| i + 1).unwrap_or(0);
    match url[file_start..].rfind('.') {
        Some(dot) => format!("{}.{}", &url[..file_start + dot], format),
        None => format!("{}.{}", url, format),
    }
}

/// Appends a cache-busting version parameter.
pub fn asset_url(url: &str, version: Option<&str>) -> String {
    match version {
        None => url.to_string(),
        Some(version) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}v={}", url, separator, version)
        }
    }
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
