//! Network seam for the worker.

use async_trait::async_trait;

use crate::client::HttpResponse;
use crate::error::{CacheError, Result};
use crate::worker::InterceptedRequest;

// == Network Trait ==
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetches `request` from its origin. Any response, whatever its status,
    /// is `Ok`; only connection-level failures are errors.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse>;
}

// == Origin Network ==
/// Forwards intercepted requests to a fixed origin with `reqwest`.
#[derive(Debug, Clone)]
pub struct OriginNetwork {
    client: reqwest::Client,
    origin: String,
}

/// Hop-by-hop headers that must not be forwarded.
const HOP_HEADERS: [&str; 5] = [
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "upgrade",
];

impl OriginNetwork {
    pub fn new(origin: &str) -> Self {
        Self::with_client(reqwest::Client::new(), origin)
    }

    pub fn with_client(client: reqwest::Client, origin: &str) -> Self {
        Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Rejects method tokens reqwest cannot send rather than guessing one.
fn parse_method(method: &str) -> Result<reqwest::Method> {
    reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|_| CacheError::InvalidRequest(format!("Invalid HTTP method: {:?}", method)))
}

#[async_trait]
impl Network for OriginNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.origin, request.path_and_query());
        let method = parse_method(&request.method)?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            if !HOP_HEADERS.contains(&name.as_str()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
