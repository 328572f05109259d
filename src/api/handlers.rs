//! API Handlers
//!
//! HTTP request handlers for the admin endpoints and the intercepting
//! fallback that hands every other request to the worker.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::app::App;
use crate::client::HttpResponse;
use crate::critical::inline_critical;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, ExtractRequest, ExtractResponse, GetResponse, HealthResponse,
    PreloadResponse, SetRequest, SetResponse, StatsResponse, UpdateRequest, WorkerInfo,
    WorkerStateResponse,
};
use crate::worker::{ClientMessage, Destination, InterceptedRequest, RequestMode};

/// Largest request body the proxy buffers before handing it to the worker
const MAX_PROXY_BODY: usize = 10 * 1024 * 1024;

/// Response headers that belong to the upstream connection
const HOP_HEADERS: [&str; 4] = ["connection", "content-length", "keep-alive", "transfer-encoding"];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

impl AppState {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Cache Administration ==
/// Handler for GET /__cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let engines = state.app.engine_stats().await;
    let session_bytes = state.app.session.used_bytes()?;
    Ok(Json(StatsResponse::new(engines, session_bytes)))
}

/// Handler for POST /__cache/clear
///
/// Drops every cached API response.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.app.client.clear_cache().await;
    Json(ClearResponse::new(state.app.api_cache.name()))
}

// == Session User Data ==
/// Handler for PUT /__session/set
pub async fn session_set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    state.app.user_cache.set(&req.key, req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /__session/get/:key
pub async fn session_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.app.user_cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /__session/del/:key
pub async fn session_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.app.user_cache.contains(&key).await {
        return Err(CacheError::NotFound(key));
    }
    state.app.user_cache.delete(&key).await;

    Ok(Json(DeleteResponse::new(key)))
}

// == Worker Control ==
/// Handler for POST /__sw/message
///
/// `SKIP_WAITING` is acknowledged with 202; `GET_VERSION` answers with the
/// controlling worker's version, or 404 when nothing controls requests.
pub async fn sw_message_handler(
    State(state): State<AppState>,
    Json(message): Json<ClientMessage>,
) -> Result<Response> {
    let reply = state.app.container.post_message(message).await?;
    match (message, reply) {
        (ClientMessage::SkipWaiting, _) => Ok(StatusCode::ACCEPTED.into_response()),
        (ClientMessage::GetVersion, Some(reply)) => Ok(Json(reply).into_response()),
        (ClientMessage::GetVersion, None) => {
            Err(CacheError::NotFound("no active worker".to_string()))
        }
    }
}

fn worker_state(app: &App) -> WorkerStateResponse {
    WorkerStateResponse {
        controller: app.container.controller().map(|w| WorkerInfo::from(w.as_ref())),
        waiting: app.container.waiting().map(|w| WorkerInfo::from(w.as_ref())),
        update_available: app.container.update_available(),
        reload_requested: app.container.reload_requested(),
    }
}

/// Handler for GET /__sw/state
pub async fn sw_state_handler(State(state): State<AppState>) -> Json<WorkerStateResponse> {
    Json(worker_state(&state.app))
}

/// Handler for POST /__sw/update
///
/// Installs a new worker version; it waits until a `SKIP_WAITING` message
/// unless nothing controls requests yet.
pub async fn sw_update_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<WorkerStateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let worker = state.app.new_worker(req.version.trim());
    state.app.container.register(worker).await?;

    Ok(Json(worker_state(&state.app)))
}

// == Critical CSS and Assets ==
/// Handler for POST /__critical/extract
pub async fn extract_handler(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Json<ExtractResponse> {
    let result = state.app.extractor.extract_from_html(&req.html, &req.css);
    let html = req
        .inline
        .then(|| inline_critical(&req.html, &result.critical_css));

    Json(ExtractResponse {
        html,
        ..ExtractResponse::from(result)
    })
}

/// Handler for POST /__assets/preload
pub async fn preload_handler(State(state): State<AppState>) -> Json<PreloadResponse> {
    let outcomes = state.app.preloader.preload_critical().await;
    Json(PreloadResponse::new(outcomes))
}

// == Interception ==
/// Fallback handler: every non-admin request goes through the worker.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let intercepted = intercepted_request(request).await?;
    debug!("[Proxy] {} {}", intercepted.method, intercepted.url);

    let response = state.app.container.handle_fetch(&intercepted).await?;
    into_axum_response(response)
}

/// Converts an incoming request into the worker's request model.
///
/// Fetch-metadata headers, when a browser sends them, carry the mode and
/// destination.
pub async fn intercepted_request(request: Request) -> Result<InterceptedRequest> {
    let (parts, body) = request.into_parts();
    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut intercepted = InterceptedRequest::new(parts.method.as_str(), url)
        .with_mode(request_mode(&parts.headers))
        .with_destination(destination(&parts.headers));
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            intercepted = intercepted.with_header(name.as_str(), value);
        }
    }

    let body = to_bytes(body, MAX_PROXY_BODY)
        .await
        .map_err(|e| CacheError::InvalidRequest(format!("unreadable body: {}", e)))?;
    if !body.is_empty() {
        intercepted = intercepted.with_body(body.to_vec());
    }
    Ok(intercepted)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn request_mode(headers: &HeaderMap) -> RequestMode {
    match header_str(headers, "sec-fetch-mode") {
        Some("navigate") => RequestMode::Navigate,
        Some("cors") => RequestMode::Cors,
        Some("no-cors") => RequestMode::NoCors,
        _ => RequestMode::SameOrigin,
    }
}

fn destination(headers: &HeaderMap) -> Destination {
    match header_str(headers, "sec-fetch-dest") {
        Some("document") => Destination::Document,
        Some("image") => Destination::Image,
        Some("script") => Destination::Script,
        Some("style") => Destination::Style,
        Some("font") => Destination::Font,
        _ => Destination::Empty,
    }
}

/// Converts a worker response back into an axum response.
pub fn into_axum_response(response: HttpResponse) -> Result<Response> {
    let mut builder = axum::http::Response::builder().status(response.status);
    for (name, value) in &response.headers {
        if !HOP_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
        .body(Body::from(response.body))
        .map_err(|e| CacheError::Internal(format!("invalid upstream response: {}", e)))
}
