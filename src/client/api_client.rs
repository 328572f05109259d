//! API Client
//!
//! Cache-aside HTTP client: read-only requests are answered from the
//! API-response engine when possible, everything else goes to the
//! network under a per-attempt timeout with exponential backoff.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheEngine, CacheStats};
use crate::client::{
    ApiResponse, ClientConfig, HttpMethod, RequestDescriptor, RequestOptions, Transport,
};
use crate::error::{CacheError, Result};

// == API Client ==
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<CacheEngine<ApiResponse>>,
}

impl ApiClient {
    // == Constructor ==
    /// Creates a client writing cached responses to `cache`.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<CacheEngine<ApiResponse>>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // == Request ==
    /// Resolves `options` against the client defaults and performs the call.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        let descriptor = RequestDescriptor::resolve(&self.config, url, options);
        self.execute(descriptor).await
    }

    /// Performs a fully resolved request.
    ///
    /// 1. Read-only cached calls return a live cache entry without network access
    /// 2. Otherwise the network is tried up to `retry_attempts` times
    /// 3. Successful read-only cached calls are written back with the call's TTL
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
        let cache_key = descriptor.cache_key();

        if descriptor.uses_cache() {
            if let Some(mut cached) = self.cache.get(&cache_key).await {
                debug!("[API] Cache hit for: {}", descriptor.url);
                cached.cached = true;
                return Ok(cached);
            }
        }

        let response = self.send_with_retry(&descriptor).await?;

        if descriptor.uses_cache() && response.is_success() {
            // Never surfaces storage trouble; only invalid input can fail here
            if let Err(e) = self
                .cache
                .set(&cache_key, response.clone(), Some(descriptor.ttl))
                .await
            {
                warn!("[API] Response for {} not cached: {}", descriptor.url, e);
            } else {
                debug!("[API] Cached response for: {}", descriptor.url);
            }
        }

        Ok(response)
    }

    // == Retry ==
    /// Runs attempts until one succeeds, a non-transient error occurs or
    /// the attempt budget is spent. The delay doubles after every failure.
    async fn send_with_retry(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        let attempts = descriptor.retry_attempts.max(1);
        let mut delay = descriptor.retry_delay;
        let mut attempt = 1;

        loop {
            match self.attempt(descriptor).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < attempts && e.is_transient() => {
                    warn!(
                        "[API] {} {} failed (attempt {}/{}): {}; retrying in {:?}",
                        descriptor.method, descriptor.url, attempt, attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "[API] {} {} failed after {} attempt(s): {}",
                        descriptor.method, descriptor.url, attempt, e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// A single network attempt bounded by the descriptor's timeout.
    async fn attempt(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        let response = tokio::time::timeout(descriptor.timeout, self.transport.send(descriptor))
            .await
            .map_err(|_| CacheError::Timeout(descriptor.timeout.as_millis() as u64))??;

        if !response.is_success() && descriptor.fail_on_error_status {
            return Err(CacheError::HttpStatus {
                status: response.status,
                reason: response.status_text,
            });
        }

        Ok(ApiResponse::from_http(response))
    }

    // == Convenience Methods ==
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.with_method(url, HttpMethod::Get, None, options).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.with_method(url, HttpMethod::Post, body, options).await
    }

    pub async fn put(
        &self,
        url: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.with_method(url, HttpMethod::Put, body, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.with_method(url, HttpMethod::Delete, None, options).await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.with_method(url, HttpMethod::Patch, body, options).await
    }

    async fn with_method(
        &self,
        url: &str,
        method: HttpMethod,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let options = RequestOptions {
            method: Some(method),
            body: body.or(options.body),
            ..options
        };
        self.request(url, options).await
    }

    // == Cache Management ==
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("[API] Cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// Endpoints the dashboard reads through the client.
pub mod endpoints {
    pub const PUBLICATIONS: &str = "/api/publications";
    pub const PROJECTS: &str = "/api/projects";
    pub const CERTIFICATIONS: &str = "/api/certifications";
    pub const SKILLS: &str = "/api/skills";
    pub const EXPERIENCE: &str = "/api/experience";
    pub const EDUCATION: &str = "/api/education";

    pub const ALL: [&str; 6] = [
        PUBLICATIONS,
        PROJECTS,
        CERTIFICATIONS,
        SKILLS,
        EXPERIENCE,
        EDUCATION,
    ];
}
