//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine, request client and worker.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage backend read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage backend refused the write because its quota is used up
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No response arrived within the attempt timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Origin answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Worker could not seed its static manifest
    #[error("Install failed for {url}: {reason}")]
    InstallFailed { url: String, reason: String },

    /// Lifecycle event not allowed in the current state
    #[error("Invalid lifecycle transition: {event} while {state}")]
    InvalidTransition { state: String, event: String },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Transient failures are the ones the request client retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::Timeout(_) | CacheError::Network(_) | CacheError::HttpStatus { .. }
        )
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CacheError::Timeout(0)
        } else {
            CacheError::Network(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Network(_) | CacheError::HttpStatus { .. } => StatusCode::BAD_GATEWAY,
            CacheError::QuotaExceeded(_) | CacheError::InstallFailed { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Storage(_) | CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CacheError::Timeout(100).is_transient());
        assert!(CacheError::Network("reset".into()).is_transient());
        assert!(CacheError::HttpStatus {
            status: 503,
            reason: "Service Unavailable".into()
        }
        .is_transient());
        assert!(!CacheError::InvalidRequest("bad".into()).is_transient());
    }

    #[test]
    fn test_error_status_mapping() {
        let response = CacheError::NotFound("k".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CacheError::Timeout(10).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
