//! Transport
//!
//! One network attempt, abstracted so the client and the preloader can
//! be driven without sockets.

use async_trait::async_trait;

use crate::client::{HttpResponse, RequestDescriptor};
use crate::error::Result;

// == Transport Trait ==
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs exactly one network attempt. Timeouts and retries are the
    /// caller's concern.
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse>;
}

// == HTTP Transport ==
/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
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
