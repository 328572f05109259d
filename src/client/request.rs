//! Request descriptors
//!
//! Per-call request shape and the client-wide defaults it is built from.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::hash_key;

// == HTTP Method ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Only read-only requests are ever answered from or written to the cache.
    pub fn is_read_only(self) -> bool {
        matches!(self, HttpMethod::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

// == Cache Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    Enabled,
    Disabled,
}

// == Client Config ==
/// Defaults applied to every request unless overridden per call.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix for URLs that do not start with `http`
    pub base_url: String,
    pub headers: BTreeMap<String, String>,
    pub cache_policy: CachePolicy,
    pub ttl: Duration,
    /// Total attempts per request, including the first
    pub retry_attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub retry_delay: Duration,
    /// Hard limit per attempt
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            base_url: String::new(),
            headers,
            cache_policy: CachePolicy::Enabled,
            ttl: Duration::from_secs(5 * 60),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }
}

// == Request Options ==
/// Per-call overrides of [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub cache_policy: Option<CachePolicy>,
    pub ttl: Option<Duration>,
    pub retry_attempts: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub timeout: Option<Duration>,
    /// `Some(false)` hands non-2xx responses back instead of failing
    pub fail_on_error_status: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_cache(mut self) -> Self {
        self.cache_policy = Some(CachePolicy::Disabled);
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = Some(attempts);
        self.retry_delay = Some(delay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn accept_error_status(mut self) -> Self {
        self.fail_on_error_status = Some(false);
        self
    }
}

// == Request Descriptor ==
/// Fully resolved request, constructed per call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub cache_policy: CachePolicy,
    pub ttl: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub fail_on_error_status: bool,
}

impl RequestDescriptor {
    /// Merges client defaults with per-call options.
    pub fn resolve(config: &ClientConfig, url: &str, options: RequestOptions) -> Self {
        let url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", config.base_url, url)
        };

        let mut headers = config.headers.clone();
        headers.extend(options.headers);

        Self {
            url,
            method: options.method.unwrap_or(HttpMethod::Get),
            headers,
            body: options.body,
            cache_policy: options.cache_policy.unwrap_or(config.cache_policy),
            ttl: options.ttl.unwrap_or(config.ttl),
            retry_attempts: options.retry_attempts.unwrap_or(config.retry_attempts),
            retry_delay: options.retry_delay.unwrap_or(config.retry_delay),
            timeout: options.timeout.unwrap_or(config.timeout),
            fail_on_error_status: options.fail_on_error_status.unwrap_or(true),
        }
    }

    /// Deterministic key over method, URL and serialized body.
    pub fn cache_key(&self) -> String {
        let mut raw = format!("{}:{}", self.method, self.url);
        if let Some(body) = &self.body {
            raw.push(':');
            raw.push_str(&body.to_string());
        }
        hash_key(&raw)
    }

    /// Whether this call reads from and writes to the response cache.
    pub fn uses_cache(&self) -> bool {
        self.method.is_read_only() && self.cache_policy == CachePolicy::Enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_prefixes_relative_urls() {
        let config = ClientConfig {
            base_url: "https://cv.example".to_string(),
            ..ClientConfig::default()
        };

        let relative = RequestDescriptor::resolve(&config, "/api/skills", RequestOptions::new());
        let absolute =
            RequestDescriptor::resolve(&config, "https://other.example/x", RequestOptions::new());

        assert_eq!(relative.url, "https://cv.example/api/skills");
        assert_eq!(absolute.url, "https://other.example/x");
        assert_eq!(relative.retry_attempts, 3);
        assert_eq!(relative.headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let config = ClientConfig::default();
        let make = |body: serde_json::Value| {
            RequestDescriptor::resolve(
                &config,
                "/api/publications",
                RequestOptions {
                    method: Some(HttpMethod::Post),
                    body: Some(body),
                    ..RequestOptions::default()
                },
            )
        };

        assert_eq!(
            make(json!({"b": 2, "a": 1})).cache_key(),
            make(json!({"a": 1, "b": 2})).cache_key()
        );
        assert_ne!(make(json!({"a": 1})).cache_key(), make(json!({"a": 2})).cache_key());
    }

    #[test]
    fn test_cache_key_depends_on_method() {
        let config = ClientConfig::default();
        let get = RequestDescriptor::resolve(&config, "/api/x", RequestOptions::new());
        let delete = RequestDescriptor::resolve(
            &config,
            "/api/x",
            RequestOptions {
                method: Some(HttpMethod::Delete),
                ..RequestOptions::default()
            },
        );
        assert_ne!(get.cache_key(), delete.cache_key());
    }

    #[test]
    fn test_uses_cache_only_for_enabled_reads() {
        let config = ClientConfig::default();
        let get = RequestDescriptor::resolve(&config, "/a", RequestOptions::new());
        let uncached = RequestDescriptor::resolve(&config, "/a", RequestOptions::new().no_cache());
        let post = RequestDescriptor::resolve(
            &config,
            "/a",
            RequestOptions {
                method: Some(HttpMethod::Post),
                ..RequestOptions::default()
            },
        );

        assert!(get.uses_cache());
        assert!(!uncached.uses_cache());
        assert!(!post.uses_cache());
    }
}
