//! Routing policy
//!
//! Pure mapping from request shape to fetch strategy. Independent of the
//! worker's lifecycle and of any storage.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::worker::{InterceptedRequest, RequestMode};

/// API paths cached by the worker even outside `/api/`.
pub const DEFAULT_API_ENDPOINTS: [&str; 3] =
    ["/api/publications", "/api/projects", "/api/certifications"];

// == Strategy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Straight to the network, never cached
    Bypass,
    /// Static generation first, network on miss
    CacheFirst,
    /// Network first, dynamic generation then offline indicator on failure
    NetworkFirstApi,
    /// Network first, cached page then offline document on failure
    NetworkFirstDocument,
    /// Network first, any generation on failure
    NetworkWithCacheFallback,
}

fn static_asset_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\.(js|css|png|jpg|jpeg|gif|svg|ico|woff|woff2|ttf|eot)$").expect("Invalid regex")
    })
}

pub fn is_static_asset(path: &str) -> bool {
    static_asset_regex().is_match(path)
}

pub fn is_api_request(path: &str, api_endpoints: &[String]) -> bool {
    path.starts_with("/api/") || api_endpoints.iter().any(|api| path.contains(api.as_str()))
}

pub fn is_navigation_request(request: &InterceptedRequest) -> bool {
    request.mode == RequestMode::Navigate
        || (request.is_get()
            && request
                .header("accept")
                .map(|accept| accept.contains("text/html"))
                .unwrap_or(false))
}

// == Route Policy ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    api_endpoints: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_API_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }
}

impl RoutePolicy {
    pub fn new(api_endpoints: Vec<String>) -> Self {
        Self { api_endpoints }
    }

    /// Exactly one strategy per request. Checks run in table order: method,
    /// static extension, API path, navigation, everything else.
    pub fn route(&self, request: &InterceptedRequest) -> Strategy {
        let path = request.path();
        if !request.is_get() {
            Strategy::Bypass
        } else if is_static_asset(path) {
            Strategy::CacheFirst
        } else if is_api_request(path, &self.api_endpoints) {
            Strategy::NetworkFirstApi
        } else if is_navigation_request(request) {
            Strategy::NetworkFirstDocument
        } else {
            Strategy::NetworkWithCacheFallback
        }
    }
}
