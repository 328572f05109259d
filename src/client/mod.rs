//! Request Client Module
//!
//! Cache-aware HTTP client built on the API-response cache engine.

mod api_client;
mod request;
mod response;
mod transport;

pub use api_client::{endpoints, ApiClient};
pub use request::{CachePolicy, ClientConfig, HttpMethod, RequestDescriptor, RequestOptions};
pub use response::{reason_phrase, ApiResponse, HttpResponse};
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
pub(crate) use transport::mock;
