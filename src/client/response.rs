//! Response types
//!
//! Raw transport responses and the decoded form the client hands out and caches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::current_timestamp_ms;

// == HTTP Response ==
/// What a [`Transport`](super::Transport) returns for one attempt. The
/// worker stores these verbatim in its generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    #[serde(with = "crate::cache::serde_hex")]
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// == API Response ==
/// Decoded response as returned to callers and stored in the API cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub data: serde_json::Value,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// True when served from the cache without network access
    pub cached: bool,
    /// When the response was received (Unix milliseconds)
    pub timestamp: u64,
}

impl ApiResponse {
    /// Decodes the body as JSON; empty bodies become `null` and non-JSON
    /// bodies become a JSON string.
    pub fn from_http(response: HttpResponse) -> Self {
        let data = if response.body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&response.body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&response.body).into_owned())
            })
        };

        Self {
            data,
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            cached: false,
            timestamp: current_timestamp_ms(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Canonical reason phrase for a status code.
pub fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}
