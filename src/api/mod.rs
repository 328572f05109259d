//! API Module
//!
//! HTTP handlers and routing for the admin surface and the intercepting
//! proxy.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `/__cache/*` - Engine statistics and API cache clearing
//! - `/__session/*` - Session-scoped user data
//! - `/__sw/*` - Worker messages, state and updates
//! - `/__critical/extract`, `/__assets/preload` - Critical resources
//! - everything else - Routed through the controlling worker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
