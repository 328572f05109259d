//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::assets::PreloadOutcome;
use crate::cache::CacheStats;
use crate::critical::{CriticalCssResult, SizeStats};
use crate::worker::{ServiceWorker, WorkerState};

/// Response body for GET /__session/get/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /__session/set
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /__session/del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /__cache/clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub engine: String,
}

impl ClearResponse {
    pub fn new(engine: impl Into<String>) -> Self {
        let engine = engine.into();
        Self {
            message: format!("Cache '{}' cleared", engine),
            engine,
        }
    }
}

/// Statistics of one named engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatsResponse {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
}

/// Response body for GET /__cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub engines: Vec<EngineStatsResponse>,
    /// Bytes held in session storage across every namespace
    pub session_bytes: u64,
}

impl StatsResponse {
    pub fn new(engines: impl IntoIterator<Item = (String, CacheStats)>, session_bytes: u64) -> Self {
        Self {
            engines: engines
                .into_iter()
                .map(|(name, stats)| EngineStatsResponse { name, stats })
                .collect(),
            session_bytes,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerInfo {
    pub version: String,
    pub state: WorkerState,
}

impl From<&ServiceWorker> for WorkerInfo {
    fn from(worker: &ServiceWorker) -> Self {
        Self {
            version: worker.version().to_string(),
            state: worker.state(),
        }
    }
}

/// Response body for GET /__sw/state and POST /__sw/update
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStateResponse {
    pub controller: Option<WorkerInfo>,
    pub waiting: Option<WorkerInfo>,
    pub update_available: bool,
    pub reload_requested: bool,
}

/// Response body for POST /__critical/extract
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    pub critical_css: String,
    pub deferred_css: String,
    /// Selectors of the critical rules, highest specificity first
    pub critical_selectors: Vec<String>,
    pub deferred_count: usize,
    pub size: SizeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl From<CriticalCssResult> for ExtractResponse {
    fn from(result: CriticalCssResult) -> Self {
        Self {
            critical_selectors: result
                .critical_rules
                .iter()
                .map(|rule| rule.selector.clone())
                .collect(),
            deferred_count: result.deferred_rules.len(),
            critical_css: result.critical_css,
            deferred_css: result.deferred_css,
            size: result.size,
            html: None,
        }
    }
}

/// Response body for POST /__assets/preload
#[derive(Debug, Clone, Serialize)]
pub struct PreloadResponse {
    pub loaded: usize,
    pub failed: usize,
    pub outcomes: Vec<PreloadOutcome>,
}

impl PreloadResponse {
    pub fn new(outcomes: Vec<PreloadOutcome>) -> Self {
        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        Self {
            loaded,
            failed: outcomes.len() - loaded,
            outcomes,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
