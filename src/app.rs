//! Application Composition
//!
//! Builds the three cache engines, the request client, the asset
//! preloader, the critical CSS extractor and the worker container from a
//! single [`Config`], and owns them for the lifetime of the server.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::assets::{AssetPreloader, AssetRecord, PreloadConfig, PreloadOutcome};
use crate::cache::{
    CacheEngine, CacheStats, DurableBackend, MemoryBackend, SessionStorage, StorageBackend,
};
use crate::client::{ApiClient, ApiResponse, HttpTransport, Transport};
use crate::config::Config;
use crate::critical::{CriticalCssExtractor, ExtractorConfig};
use crate::error::Result;
use crate::worker::{
    DiskGenerations, GenerationStorage, MemoryGenerations, Network, OriginNetwork, ServiceWorker,
    WorkerContainer,
};

// == App ==
/// Every long-lived component of the caching layer.
pub struct App {
    pub config: Config,
    /// Durable engine behind the asset preloader
    pub static_cache: Arc<CacheEngine<AssetRecord>>,
    /// Memory-only engine behind the request client
    pub api_cache: Arc<CacheEngine<ApiResponse>>,
    /// Session-scoped engine for user data
    pub user_cache: Arc<CacheEngine<Value>>,
    pub session: SessionStorage,
    pub client: ApiClient,
    pub preloader: AssetPreloader,
    pub extractor: CriticalCssExtractor,
    pub container: WorkerContainer,
    worker_storage: Arc<dyn GenerationStorage>,
    network: Arc<dyn Network>,
}

impl App {
    // == Constructors ==
    /// Opens the on-disk storage under `config.cache_dir` and wires the
    /// components to real HTTP.
    pub async fn build(config: Config) -> Result<Self> {
        let static_backend =
            DurableBackend::open(config.cache_dir.join("static"), config.storage_quota_bytes)
                .await?;
        let generations = DiskGenerations::open_root(config.cache_dir.join("generations")).await?;
        let network = OriginNetwork::new(&config.origin_url);

        let app = Self::assemble(
            config,
            Arc::new(static_backend),
            Arc::new(HttpTransport::new()),
            Arc::new(generations),
            Arc::new(network),
        )
        .await;
        info!("Storage opened under {:?}", app.config.cache_dir);
        Ok(app)
    }

    /// Wires every component to memory storage and the given seams.
    pub async fn in_memory(
        config: Config,
        transport: Arc<dyn Transport>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::assemble(
            config,
            Arc::new(MemoryBackend),
            transport,
            Arc::new(MemoryGenerations::new()),
            network,
        )
        .await
    }

    async fn assemble(
        config: Config,
        static_backend: Arc<dyn StorageBackend>,
        transport: Arc<dyn Transport>,
        worker_storage: Arc<dyn GenerationStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        let session = SessionStorage::new(config.storage_quota_bytes);

        let static_cache: Arc<CacheEngine<AssetRecord>> =
            Arc::new(CacheEngine::open(config.static_engine(), static_backend).await);
        let api_cache: Arc<CacheEngine<ApiResponse>> =
            Arc::new(CacheEngine::new(config.api_engine(), Arc::new(MemoryBackend)));
        let user_cache: Arc<CacheEngine<Value>> = Arc::new(
            CacheEngine::open(config.user_engine(), Arc::new(session.backend("user"))).await,
        );

        let client = ApiClient::new(config.client(), transport.clone(), api_cache.clone());
        let preload_config = PreloadConfig {
            base_url: config.client().base_url,
            timeout: client.config().timeout,
            ttl: static_cache.config().default_ttl,
            ..PreloadConfig::default()
        };
        let preloader =
            AssetPreloader::with_default_assets(preload_config, static_cache.clone(), transport);

        Self {
            container: WorkerContainer::new(network.clone()),
            extractor: CriticalCssExtractor::new(ExtractorConfig::default()),
            config,
            static_cache,
            api_cache,
            user_cache,
            session,
            client,
            preloader,
            worker_storage,
            network,
        }
    }

    // == Worker ==
    /// A fresh worker for `version`, sharing this app's storage and origin.
    pub fn new_worker(&self, version: &str) -> Arc<ServiceWorker> {
        let config = self.config.worker().with_version(version);
        Arc::new(ServiceWorker::new(
            config,
            self.worker_storage.clone(),
            self.network.clone(),
        ))
    }

    // == Startup ==
    /// Registers the configured worker version and warms the static cache.
    ///
    /// Neither step is fatal: a failed install leaves requests flowing to
    /// the origin and failed assets are only logged.
    pub async fn start(&self) -> Vec<PreloadOutcome> {
        let worker = self.new_worker(&self.config.worker_version);
        if let Err(e) = self.container.register(worker).await {
            error!("[SW] Registration failed: {}", e);
        }

        let outcomes = self.preloader.preload_critical().await;
        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        info!("Preloaded {}/{} critical assets", loaded, outcomes.len());
        outcomes
    }

    /// Stats of the static, API and user engines, in that order.
    pub async fn engine_stats(&self) -> [(String, CacheStats); 3] {
        [
            (self.static_cache.name().to_string(), self.static_cache.stats().await),
            (self.api_cache.name().to_string(), self.api_cache.stats().await),
            (self.user_cache.name().to_string(), self.user_cache.stats().await),
        ]
    }
}
