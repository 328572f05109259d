//! Portfolio Cache - offline-resilient caching layer for a CV dashboard
//!
//! TTL/LRU cache engines over memory, durable and session storage, a
//! cache-aware HTTP client, an asset preloader, a critical CSS extractor
//! and a versioned request-intercepting worker.

pub mod api;
pub mod app;
pub mod assets;
pub mod cache;
pub mod client;
pub mod config;
pub mod critical;
pub mod error;
pub mod models;
pub mod worker;

pub use api::AppState;
pub use app::App;
pub use config::Config;
pub use error::{CacheError, Result};
