//! Interception Worker
//!
//! One worker version: seeds its static generation on install, removes
//! stale generations on activate, then answers intercepted requests with
//! the strategy the routing policy picks.

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assets::MediaKind;
use crate::client::HttpResponse;
use crate::error::{CacheError, Result};
use crate::worker::lifecycle::{transition, LifecycleEvent};
use crate::worker::{
    Destination, GenerationStorage, InterceptedRequest, Network, RoutePolicy, Strategy,
    VersionReply, WorkerMessage, WorkerState, DEFAULT_API_ENDPOINTS,
};

/// Served for image requests that fail with nothing cached.
pub const IMAGE_FALLBACK: &str = "/images/error/404.svg";

/// Served for navigations that fail with nothing cached.
pub const OFFLINE_DOCUMENT: &str = "/index.html";

pub const OFFLINE_API_BODY: &str = r#"{"error":"Offline - No cached data"}"#;

/// Resources fetched into the static generation at install.
pub const DEFAULT_STATIC_MANIFEST: [&str; 14] = [
    "/",
    "/index.html",
    "/cv",
    "/publications",
    "/github-projects",
    "/certifications",
    "/about",
    "/vinod.png",
    "/images/logo/logo.png",
    "/images/logo/vinod-cv-logo.svg",
    "/images/logo/vinod-cv-logo-dark.svg",
    "/images/user/owner.jpg",
    "/images/shape/grid-01.svg",
    IMAGE_FALLBACK,
];

const NOTIFICATION_TITLE: &str = "Dr. Vinod CV Dashboard";
const NOTIFICATION_ICON: &str = "/images/logo/logo.png";

// == Worker Config ==
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Build identifier, also the version token in generation names
    pub version: String,
    pub static_manifest: Vec<String>,
    pub api_endpoints: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: "v1.0.0".to_string(),
            static_manifest: DEFAULT_STATIC_MANIFEST.iter().map(|s| s.to_string()).collect(),
            api_endpoints: DEFAULT_API_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WorkerConfig {
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }
}

pub fn static_generation_name(version: &str) -> String {
    format!("portfolio-static-{}", version)
}

pub fn dynamic_generation_name(version: &str) -> String {
    format!("portfolio-dynamic-{}", version)
}

// == Notifications ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub actions: Vec<NotificationAction>,
}

// == Service Worker ==
pub struct ServiceWorker {
    config: WorkerConfig,
    policy: RoutePolicy,
    storage: Arc<dyn GenerationStorage>,
    network: Arc<dyn Network>,
    state: Mutex<WorkerState>,
}

impl ServiceWorker {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn GenerationStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            policy: RoutePolicy::new(config.api_endpoints.clone()),
            config,
            storage,
            network,
            state: Mutex::new(WorkerState::Installing),
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn static_generation(&self) -> String {
        static_generation_name(&self.config.version)
    }

    pub fn dynamic_generation(&self) -> String {
        dynamic_generation_name(&self.config.version)
    }

    /// Generations this version owns; activation deletes every other one.
    pub fn declared_generations(&self) -> [String; 2] {
        [self.static_generation(), self.dynamic_generation()]
    }

    fn apply(&self, event: LifecycleEvent) -> Result<WorkerState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let next = transition(*state, event)?;
        if next != *state {
            debug!("[SW {}] {} -> {}", self.config.version, *state, next);
        }
        *state = next;
        Ok(next)
    }

    // == Install ==
    /// Fetches the whole static manifest, then stores it. Any failed entry
    /// fails the install and nothing is kept.
    pub async fn install(&self) -> Result<()> {
        if self.state() != WorkerState::Installing {
            return Err(CacheError::InvalidTransition {
                state: self.state().to_string(),
                event: "install".to_string(),
            });
        }
        info!("[SW {}] Installing", self.config.version);

        match self.seed_static_generation().await {
            Ok(count) => {
                self.apply(LifecycleEvent::InstallSucceeded)?;
                info!("[SW {}] Cached {} static files", self.config.version, count);
                Ok(())
            }
            Err(e) => {
                self.apply(LifecycleEvent::InstallFailed)?;
                warn!("[SW {}] Install failed: {}", self.config.version, e);
                Err(e)
            }
        }
    }

    async fn seed_static_generation(&self) -> Result<usize> {
        let fetches = self.config.static_manifest.iter().map(|url| async move {
            let request = InterceptedRequest::get(url);
            match self.network.fetch(&request).await {
                Ok(response) if response.is_success() => Ok((request.cache_key(), response)),
                Ok(response) => Err(CacheError::InstallFailed {
                    url: url.clone(),
                    reason: format!("HTTP {}", response.status),
                }),
                Err(e) => Err(CacheError::InstallFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                }),
            }
        });
        let fetched = join_all(fetches)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        // A generation left by an earlier install of the same version keeps
        // its entries; each put replaces one key with a fresh copy, so a
        // failure midway leaves only complete responses behind.
        let generation = self.static_generation();
        let existed = self.storage.keys().await?.contains(&generation);
        self.storage.open(&generation).await?;
        for (key, response) in &fetched {
            if let Err(e) = self.storage.put(&generation, key, response).await {
                if existed {
                    warn!(
                        "[SW {}] Keeping earlier contents of {} after failed seed",
                        self.config.version, generation
                    );
                } else if let Err(cleanup) = self.storage.delete(&generation).await {
                    warn!(
                        "[SW {}] Could not remove partial generation {}: {}",
                        self.config.version, generation, cleanup
                    );
                }
                return Err(CacheError::InstallFailed {
                    url: key.clone(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(fetched.len())
    }

    // == Activate ==
    /// Deletes every generation not declared by this version and starts
    /// controlling requests. Returns the deleted generation names.
    ///
    /// A storage failure during cleanup puts the worker back in `Waiting`
    /// so activation can be retried.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let previous = self.state();
        self.apply(LifecycleEvent::Activate)?;
        if previous != WorkerState::Waiting {
            return Ok(Vec::new());
        }
        info!("[SW {}] Activating", self.config.version);

        match self.delete_undeclared_generations().await {
            Ok(deleted) => {
                self.apply(LifecycleEvent::ActivationComplete)?;
                info!("[SW {}] Activated", self.config.version);
                Ok(deleted)
            }
            Err(e) => {
                self.apply(LifecycleEvent::ActivationFailed)?;
                warn!("[SW {}] Activation failed: {}", self.config.version, e);
                Err(e)
            }
        }
    }

    async fn delete_undeclared_generations(&self) -> Result<Vec<String>> {
        let declared = self.declared_generations();
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if !declared.contains(&name) {
                info!("[SW {}] Deleting old generation: {}", self.config.version, name);
                self.storage.delete(&name).await?;
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Activates a waiting worker immediately. No-op once activating.
    pub async fn skip_waiting(&self) -> Result<()> {
        match self.state() {
            WorkerState::Activating | WorkerState::Activated => Ok(()),
            _ => self.activate().await.map(|_| ()),
        }
    }

    /// Marks this worker as superseded by a newer controller.
    pub fn replace(&self) -> Result<()> {
        self.apply(LifecycleEvent::Replaced).map(|_| ())
    }

    // == Messages ==
    pub async fn post_message(&self, message: WorkerMessage) -> Result<()> {
        match message {
            WorkerMessage::SkipWaiting => {
                debug!("[SW {}] SKIP_WAITING received", self.config.version);
                self.skip_waiting().await
            }
            WorkerMessage::GetVersion { reply } => {
                // Receiver may have given up waiting
                let _ = reply.send(VersionReply {
                    version: self.config.version.clone(),
                });
                Ok(())
            }
        }
    }

    // == Fetch ==
    /// Answers an intercepted request. Until activation every request goes
    /// straight to the network.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        if self.state() != WorkerState::Activated {
            return self.network.fetch(request).await;
        }

        let strategy = self.policy.route(request);
        debug!(
            "[SW {}] {} {} -> {:?}",
            self.config.version, request.method, request.url, strategy
        );

        match strategy {
            Strategy::Bypass => self.network.fetch(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirstApi => self.network_first_api(request).await,
            Strategy::NetworkFirstDocument => self.network_first_document(request).await,
            Strategy::NetworkWithCacheFallback => self.network_with_cache_fallback(request).await,
        }
    }

    async fn cache_first(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        let generation = self.static_generation();
        let key = request.cache_key();
        if let Some(cached) = self.lookup(&generation, &key).await {
            return Ok(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store(&generation, &key, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                if is_image_request(request) {
                    if let Some(fallback) = self.lookup(&generation, IMAGE_FALLBACK).await {
                        return Ok(fallback);
                    }
                }
                Err(e)
            }
        }
    }

    async fn network_first_api(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        let generation = self.dynamic_generation();
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store(&generation, &key, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!("[SW {}] API offline for {}: {}", self.config.version, key, e);
                Ok(match self.lookup(&generation, &key).await {
                    Some(cached) => cached,
                    None => HttpResponse::new(503, OFFLINE_API_BODY)
                        .with_header("content-type", "application/json"),
                })
            }
        }
    }

    async fn network_first_document(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        let generation = self.static_generation();
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store(&generation, &key, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                if let Some(cached) = self.lookup(&generation, &key).await {
                    return Ok(cached);
                }
                match self.lookup(&generation, OFFLINE_DOCUMENT).await {
                    Some(offline) => Ok(offline),
                    None => Err(e),
                }
            }
        }
    }

    async fn network_with_cache_fallback(
        &self,
        request: &InterceptedRequest,
    ) -> Result<HttpResponse> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => match self.storage.match_any(&request.cache_key()).await {
                Ok(Some(cached)) => Ok(cached),
                _ => Err(e),
            },
        }
    }

    /// Storage read errors count as misses.
    async fn lookup(&self, generation: &str, key: &str) -> Option<HttpResponse> {
        match self.storage.match_request(generation, key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("[SW {}] Read from {} failed: {}", self.config.version, generation, e);
                None
            }
        }
    }

    /// Write-back never fails the request it belongs to.
    async fn store(&self, generation: &str, key: &str, response: &HttpResponse) {
        if let Err(e) = self.storage.put(generation, key, response).await {
            warn!("[SW {}] Could not cache {}: {}", self.config.version, key, e);
        }
    }

    // == Push ==
    /// Notification for a push message; `None` payload uses the default text.
    pub fn handle_push(&self, payload: Option<&str>) -> Notification {
        info!("[SW {}] Push notification received", self.config.version);
        let action = |action: &str, title: &str| NotificationAction {
            action: action.to_string(),
            title: title.to_string(),
        };
        Notification {
            title: NOTIFICATION_TITLE.to_string(),
            body: payload.unwrap_or("New update available").to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            actions: vec![action("explore", "View Dashboard"), action("close", "Close")],
        }
    }

    /// URL to open for a clicked notification action.
    pub fn notification_click(&self, action: &str) -> Option<String> {
        debug!("[SW {}] Notification clicked: {}", self.config.version, action);
        (action == "explore").then(|| "/".to_string())
    }
}

fn is_image_request(request: &InterceptedRequest) -> bool {
    request.destination == Destination::Image
        || MediaKind::from_url(request.path()) == MediaKind::Image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::mock::FakeNetwork;
    use crate::worker::{ClientMessage, MemoryGenerations};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory storage that fails a set number of deletes and puts first.
    struct FlakyStorage {
        inner: MemoryGenerations,
        failing_deletes: AtomicUsize,
        failing_puts: AtomicUsize,
    }

    impl FlakyStorage {
        fn new(failing_deletes: usize, failing_puts: usize) -> Self {
            Self {
                inner: MemoryGenerations::new(),
                failing_deletes: AtomicUsize::new(failing_deletes),
                failing_puts: AtomicUsize::new(failing_puts),
            }
        }

        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl GenerationStorage for FlakyStorage {
        async fn open(&self, name: &str) -> Result<()> {
            self.inner.open(name).await
        }

        async fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys().await
        }

        async fn delete(&self, name: &str) -> Result<bool> {
            if Self::take_failure(&self.failing_deletes) {
                return Err(CacheError::Storage("disk unavailable".to_string()));
            }
            self.inner.delete(name).await
        }

        async fn match_request(&self, name: &str, key: &str) -> Result<Option<HttpResponse>> {
            self.inner.match_request(name, key).await
        }

        async fn put(&self, name: &str, key: &str, response: &HttpResponse) -> Result<()> {
            if Self::take_failure(&self.failing_puts) {
                return Err(CacheError::Storage("quota exceeded".to_string()));
            }
            self.inner.put(name, key, response).await
        }
    }

    fn manifest(urls: &[&str]) -> WorkerConfig {
        WorkerConfig {
            static_manifest: urls.iter().map(|s| s.to_string()).collect(),
            ..WorkerConfig::default()
        }
    }

    async fn activated(
        config: WorkerConfig,
        network: Arc<FakeNetwork>,
    ) -> (ServiceWorker, Arc<MemoryGenerations>) {
        let storage = Arc::new(MemoryGenerations::new());
        let worker = ServiceWorker::new(config, storage.clone(), network);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        (worker, storage)
    }

    #[tokio::test]
    async fn test_static_cache_first_survives_offline_byte_for_byte() {
        let network = Arc::new(FakeNetwork::new());
        let body = vec![0x89, b'P', b'N', b'G', 0, 255];
        network.serve("/images/logo/logo.png", HttpResponse::new(200, body.clone()));
        let (worker, storage) = activated(manifest(&[]), network.clone()).await;

        let request = InterceptedRequest::get("/images/logo/logo.png");
        let first = worker.handle_fetch(&request).await.unwrap();
        assert_eq!(first.body, body);
        assert_eq!(
            storage
                .match_request(&worker.static_generation(), "/images/logo/logo.png")
                .await
                .unwrap(),
            Some(first.clone())
        );

        network.go_offline();
        let second = worker.handle_fetch(&request).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(network.fetches(), 1);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/index.html", HttpResponse::new(200, "<html>"));
        // "/about" is not served and answers 404
        let storage = Arc::new(MemoryGenerations::new());
        let worker = ServiceWorker::new(
            manifest(&["/index.html", "/about"]),
            storage.clone(),
            network,
        );

        let result = worker.install().await;

        assert!(matches!(result, Err(CacheError::InstallFailed { ref url, .. }) if url == "/about"));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_activation_can_be_retried() {
        let storage = Arc::new(FlakyStorage::new(1, 0));
        storage.open("portfolio-static-v0.9.0").await.unwrap();
        let worker = ServiceWorker::new(manifest(&[]), storage.clone(), Arc::new(FakeNetwork::new()));
        worker.install().await.unwrap();

        assert!(matches!(worker.activate().await, Err(CacheError::Storage(_))));
        assert_eq!(worker.state(), WorkerState::Waiting);

        worker.skip_waiting().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Activated);
        assert!(!storage
            .keys()
            .await
            .unwrap()
            .contains(&"portfolio-static-v0.9.0".to_string()));
    }

    #[tokio::test]
    async fn test_failed_seed_removes_new_generation() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/index.html", HttpResponse::new(200, "<html>"));
        let storage = Arc::new(FlakyStorage::new(0, 1));
        let worker = ServiceWorker::new(manifest(&["/index.html"]), storage.clone(), network);

        let result = worker.install().await;

        assert!(matches!(result, Err(CacheError::InstallFailed { ref url, .. }) if url == "/index.html"));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_seed_keeps_existing_generation() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/index.html", HttpResponse::new(200, "<html>v2"));
        let storage = Arc::new(FlakyStorage::new(0, 1));
        let generation = static_generation_name(&WorkerConfig::default().version);
        storage.open(&generation).await.unwrap();
        storage
            .inner
            .put(&generation, "/index.html", &HttpResponse::new(200, "<html>v1"))
            .await
            .unwrap();
        let worker = ServiceWorker::new(manifest(&["/index.html"]), storage.clone(), network);

        assert!(worker.install().await.is_err());

        assert_eq!(
            storage.match_request(&generation, "/index.html").await.unwrap(),
            Some(HttpResponse::new(200, "<html>v1"))
        );
    }

    #[tokio::test]
    async fn test_activation_deletes_only_undeclared_generations() {
        let network = Arc::new(FakeNetwork::new());
        let storage = Arc::new(MemoryGenerations::new());
        storage.open("portfolio-static-v0.9.0").await.unwrap();
        storage.open("portfolio-dynamic-v0.9.0").await.unwrap();
        storage.open(&dynamic_generation_name("v1.0.0")).await.unwrap();

        let worker = ServiceWorker::new(manifest(&[]), storage.clone(), network);
        worker.install().await.unwrap();
        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["portfolio-static-v0.9.0", "portfolio-dynamic-v0.9.0"]);
        let mut remaining = storage.keys().await.unwrap();
        remaining.sort();
        assert_eq!(remaining, vec!["portfolio-dynamic-v1.0.0", "portfolio-static-v1.0.0"]);
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_requests_pass_through_before_activation() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/app.js", HttpResponse::new(200, "js"));
        let storage = Arc::new(MemoryGenerations::new());
        let worker = ServiceWorker::new(manifest(&[]), storage.clone(), network);
        worker.install().await.unwrap();

        worker.handle_fetch(&InterceptedRequest::get("/app.js")).await.unwrap();

        assert_eq!(
            storage
                .match_request(&worker.static_generation(), "/app.js")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_api_network_first_with_offline_indicator() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/api/skills", HttpResponse::new(200, r#"["rust"]"#));
        let (worker, _) = activated(manifest(&[]), network.clone()).await;

        let online = worker.handle_fetch(&InterceptedRequest::get("/api/skills")).await.unwrap();
        network.go_offline();
        let cached = worker.handle_fetch(&InterceptedRequest::get("/api/skills")).await.unwrap();
        let missing = worker.handle_fetch(&InterceptedRequest::get("/api/education")).await.unwrap();

        assert_eq!(cached, online);
        assert_eq!(missing.status, 503);
        assert_eq!(missing.body, OFFLINE_API_BODY.as_bytes());
        assert_eq!(missing.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_offline_document() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/index.html", HttpResponse::new(200, "<html>offline shell</html>"));
        network.serve("/cv", HttpResponse::new(200, "<html>cv</html>"));
        let (worker, _) = activated(manifest(&["/index.html"]), network.clone()).await;

        worker.handle_fetch(&InterceptedRequest::navigate("/cv")).await.unwrap();
        network.go_offline();

        let cv = worker.handle_fetch(&InterceptedRequest::navigate("/cv")).await.unwrap();
        let other = worker.handle_fetch(&InterceptedRequest::navigate("/about")).await.unwrap();
        assert_eq!(cv.body, b"<html>cv</html>");
        assert_eq!(other.body, b"<html>offline shell</html>");
    }

    #[tokio::test]
    async fn test_failed_image_uses_fallback() {
        let network = Arc::new(FakeNetwork::new());
        network.serve(IMAGE_FALLBACK, HttpResponse::new(200, "<svg/>"));
        let (worker, _) = activated(manifest(&[IMAGE_FALLBACK]), network.clone()).await;
        network.go_offline();

        let image = worker
            .handle_fetch(&InterceptedRequest::get("/images/user/missing.jpg"))
            .await
            .unwrap();
        let script = worker.handle_fetch(&InterceptedRequest::get("/app.js")).await;

        assert_eq!(image.body, b"<svg/>");
        assert!(matches!(script, Err(CacheError::Network(_))));
    }

    #[tokio::test]
    async fn test_non_get_is_never_cached() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/api/skills", HttpResponse::new(200, "{}"));
        let (worker, storage) = activated(manifest(&[]), network).await;

        worker
            .handle_fetch(&InterceptedRequest::new("POST", "/api/skills"))
            .await
            .unwrap();

        assert_eq!(storage.match_any("/api/skills").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_version_replies_on_channel() {
        let (worker, _) = activated(manifest(&[]), Arc::new(FakeNetwork::new())).await;
        let (message, reply) = WorkerMessage::from_client(ClientMessage::GetVersion);

        worker.post_message(message).await.unwrap();

        assert_eq!(reply.unwrap().await.unwrap().version, "v1.0.0");
    }

    #[tokio::test]
    async fn test_push_and_notification_click() {
        let worker = ServiceWorker::new(
            manifest(&[]),
            Arc::new(MemoryGenerations::new()),
            Arc::new(FakeNetwork::new()),
        );

        let notification = worker.handle_push(None);
        assert_eq!(notification.body, "New update available");
        assert_eq!(notification.actions[0].action, "explore");
        assert_eq!(worker.handle_push(Some("New paper")).body, "New paper");
        assert_eq!(worker.notification_click("explore").as_deref(), Some("/"));
        assert_eq!(worker.notification_click("close"), None);
    }
}
