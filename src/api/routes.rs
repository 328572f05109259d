//! API Routes
//!
//! Configures the Axum router: the admin endpoints under reserved `/__`
//! prefixes, and a fallback that intercepts everything else.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, extract_handler, health_handler, preload_handler, proxy_handler,
    session_delete_handler, session_get_handler, session_set_handler, stats_handler,
    sw_message_handler, sw_state_handler, sw_update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /__cache/stats` - Statistics of the static, API and user engines
/// - `POST /__cache/clear` - Clear cached API responses
/// - `PUT /__session/set` - Store a user-data value
/// - `GET /__session/get/:key` - Retrieve a user-data value
/// - `DELETE /__session/del/:key` - Delete a user-data value
/// - `POST /__sw/message` - `SKIP_WAITING` / `GET_VERSION`
/// - `GET /__sw/state` - Controlling and waiting worker versions
/// - `POST /__sw/update` - Install a new worker version
/// - `POST /__critical/extract` - Split CSS into critical and deferred parts
/// - `POST /__assets/preload` - Preload the critical assets
/// - anything else - Intercepted by the controlling worker
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/__cache/stats", get(stats_handler))
        .route("/__cache/clear", post(clear_handler))
        .route("/__session/set", put(session_set_handler))
        .route("/__session/get/:key", get(session_get_handler))
        .route("/__session/del/:key", delete(session_delete_handler))
        .route("/__sw/message", post(sw_message_handler))
        .route("/__sw/state", get(sw_state_handler))
        .route("/__sw/update", post(sw_update_handler))
        .route("/__critical/extract", post(extract_handler))
        .route("/__assets/preload", post(preload_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
