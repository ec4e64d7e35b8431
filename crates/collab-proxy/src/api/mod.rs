mod forward;
mod metadata;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use collab_gateway::OpenGraphData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ProxyError;

pub use forward::{Credentials, Forwarder, UpstreamHosts};
pub use metadata::adapt_metadata;

#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    engine: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataParams {
    url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

/// Trimmed value of a required query parameter.
fn required(value: Option<&str>, name: &'static str) -> Result<String, ProxyError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ProxyError::MissingParam(name))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/gemini-proxy", post(gemini_proxy))
        .route("/search-proxy", get(search_proxy))
        .route("/metadata-proxy", get(metadata_proxy))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

async fn gemini_proxy(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ProxyError> {
    state.forwarder.generate(body).await.map(Json)
}

async fn search_proxy(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ProxyError> {
    let query = required(params.q.as_deref(), "q")?;
    let engine = params
        .engine
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or("google");
    tracing::debug!(query = %query, engine, "forwarding search");
    state.forwarder.search(&query, engine).await.map(Json)
}

async fn metadata_proxy(
    State(state): State<AppState>,
    Query(params): Query<MetadataParams>,
) -> Result<Json<OpenGraphData>, ProxyError> {
    let target = required(params.url.as_deref(), "url")?;
    let full = if target.starts_with("http") {
        target
    } else {
        format!("https://{target}")
    };
    let raw = state.forwarder.metadata(&full).await?;
    Ok(Json(adapt_metadata(&raw)))
}
