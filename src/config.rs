//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EngineConfig;
use crate::client::ClientConfig;
use crate::worker::WorkerConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin the worker forwards intercepted requests to
    pub origin_url: String,
    /// Prefix for relative request-client URLs; empty resolves against the origin
    pub api_base_url: String,
    /// Root directory for durable engines and worker generations
    pub cache_dir: PathBuf,
    /// Version tag written into every cache entry
    pub cache_version: String,
    /// Worker build identifier and generation version token
    pub worker_version: String,
    /// Byte quota for durable and session storage
    pub storage_quota_bytes: u64,
    pub static_ttl_secs: u64,
    pub static_max_entries: usize,
    pub api_ttl_secs: u64,
    pub api_max_entries: usize,
    pub user_ttl_secs: u64,
    pub user_max_entries: usize,
    pub request_timeout_ms: u64,
    /// Total attempts per request, including the first
    pub retry_attempts: u32,
    /// Initial backoff delay, doubled after every failed attempt
    pub retry_delay_ms: u64,
}

/// Reads `name` and parses it, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ORIGIN_URL` - Upstream origin (default: http://127.0.0.1:3001)
    /// - `API_BASE_URL` - Request-client base URL (default: empty)
    /// - `CACHE_DIR` - Storage root (default: .portfolio-cache)
    /// - `CACHE_VERSION` / `WORKER_VERSION` - Version tags (default: 1.0.0 / v1.0.0)
    /// - `STORAGE_QUOTA_BYTES` - Storage quota (default: 5 MiB)
    /// - `STATIC_TTL_SECS` / `STATIC_MAX_ENTRIES` - Static assets (default: 7 days / 200)
    /// - `API_TTL_SECS` / `API_MAX_ENTRIES` - API responses (default: 5 min / 50)
    /// - `USER_TTL_SECS` / `USER_MAX_ENTRIES` - Session user data (default: 30 min / 100)
    /// - `REQUEST_TIMEOUT_MS` - Per-attempt timeout (default: 10000)
    /// - `RETRY_ATTEMPTS` / `RETRY_DELAY_MS` - Retry policy (default: 3 / 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            origin_url: env_or("ORIGIN_URL", defaults.origin_url),
            api_base_url: env_or("API_BASE_URL", defaults.api_base_url),
            cache_dir: env_or("CACHE_DIR", defaults.cache_dir),
            cache_version: env_or("CACHE_VERSION", defaults.cache_version),
            worker_version: env_or("WORKER_VERSION", defaults.worker_version),
            storage_quota_bytes: env_or("STORAGE_QUOTA_BYTES", defaults.storage_quota_bytes),
            static_ttl_secs: env_or("STATIC_TTL_SECS", defaults.static_ttl_secs),
            static_max_entries: env_or("STATIC_MAX_ENTRIES", defaults.static_max_entries),
            api_ttl_secs: env_or("API_TTL_SECS", defaults.api_ttl_secs),
            api_max_entries: env_or("API_MAX_ENTRIES", defaults.api_max_entries),
            user_ttl_secs: env_or("USER_TTL_SECS", defaults.user_ttl_secs),
            user_max_entries: env_or("USER_MAX_ENTRIES", defaults.user_max_entries),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            retry_attempts: env_or("RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms),
        }
    }

    // == Derived Component Configs ==
    pub fn static_engine(&self) -> EngineConfig {
        EngineConfig::new(
            "static",
            Duration::from_secs(self.static_ttl_secs),
            self.static_max_entries,
        )
        .with_version(self.cache_version.clone())
        // Encoded assets are bounded by the storage quota instead
        .with_max_value_bytes(None)
    }

    pub fn api_engine(&self) -> EngineConfig {
        EngineConfig::new("api", Duration::from_secs(self.api_ttl_secs), self.api_max_entries)
            .with_version(self.cache_version.clone())
    }

    pub fn user_engine(&self) -> EngineConfig {
        EngineConfig::new(
            "user",
            Duration::from_secs(self.user_ttl_secs),
            self.user_max_entries,
        )
        .with_version(self.cache_version.clone())
    }

    /// Request-client defaults. An empty base URL resolves against the origin.
    pub fn client(&self) -> ClientConfig {
        let base_url = if self.api_base_url.is_empty() {
            self.origin_url.trim_end_matches('/').to_string()
        } else {
            self.api_base_url.clone()
        };
        ClientConfig {
            base_url,
            ttl: Duration::from_secs(self.api_ttl_secs),
            retry_attempts: self.retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_millis(self.request_timeout_ms),
            ..ClientConfig::default()
        }
    }

    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig::default().with_version(&self.worker_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            origin_url: "http://127.0.0.1:3001".to_string(),
            api_base_url: String::new(),
            cache_dir: PathBuf::from(".portfolio-cache"),
            cache_version: "1.0.0".to_string(),
            worker_version: "v1.0.0".to_string(),
            storage_quota_bytes: 5 * 1024 * 1024,
            static_ttl_secs: 7 * 24 * 60 * 60,
            static_max_entries: 200,
            api_ttl_secs: 5 * 60,
            api_max_entries: 50,
            user_ttl_secs: 30 * 60,
            user_max_entries: 100,
            request_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.api_max_entries, 50);
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("API_TTL_SECS");
        env::remove_var("WORKER_VERSION");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.api_ttl_secs, 300);
        assert_eq!(config.worker_version, "v1.0.0");
    }

    #[test]
    fn test_derived_configs() {
        let config = Config {
            cache_version: "2.0.0".to_string(),
            ..Config::default()
        };

        let api = config.api_engine();
        assert_eq!(api.name, "api");
        assert_eq!(api.default_ttl, Duration::from_secs(300));
        assert_eq!(api.version, "2.0.0");
        assert_eq!(config.static_engine().max_entries, 200);
        assert_eq!(config.static_engine().max_value_bytes, None);
        assert!(config.api_engine().max_value_bytes.is_some());
        assert_eq!(config.user_engine().default_ttl, Duration::from_secs(1800));

        let client = config.client();
        assert_eq!(client.base_url, "http://127.0.0.1:3001");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(config.worker().version, "v1.0.0");
    }
}
