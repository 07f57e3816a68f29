//! Unified API router for Redactr
//!
//! Merges the module routers into a single axum `Router` with request
//! tracing, CORS and a body limit matching the extractor's input limit.
//!
//! ## Endpoint Map
//!
//! | Route             | Module    | Description                      |
//! |-------------------|-----------|----------------------------------|
//! | `/health`         | api       | Health probe with model name     |
//! | `/api/v1/redact`  | redaction | PDF upload → sanitized text      |

use crate::pipeline::Pipeline;
use crate::redaction::{redact_router, RedactState};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Redactr HTTP application
pub fn build_app(pipeline: Arc<Pipeline>, cors_origins: &[String]) -> Router {
    let body_limit = pipeline.max_bytes();

    Router::new()
        .route("/health", get(health_check))
        .with_state(pipeline.clone())
        .merge(redact_router(RedactState { pipeline }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    model: String,
}

async fn health_check(State(pipeline): State<Arc<Pipeline>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: pipeline.model_name().to_string(),
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}
