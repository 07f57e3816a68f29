//! HTTP handler for the redaction API
//!
//! - POST /api/v1/redact?mode=replace|delete  — PDF body in, sanitized text out

use super::engine::{PassReport, RedactionMode};
use crate::error::Error;
use crate::pipeline::Pipeline;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared state for redaction handlers
#[derive(Clone)]
pub struct RedactState {
    pub pipeline: Arc<Pipeline>,
}

/// Create the redaction router
pub fn redact_router(state: RedactState) -> Router {
    Router::new()
        .route("/api/v1/redact", post(redact))
        .with_state(state)
}

// =============================================================================
// Request / Response types
// =============================================================================

/// Query params for the redact endpoint
#[derive(Debug, Deserialize)]
pub struct RedactQuery {
    pub mode: Option<String>,
}

/// Response from the redact endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactResponse {
    pub redacted_text: String,
    /// The PDF had no extractable text
    pub empty: bool,
    pub mode: RedactionMode,
    pub replacements_count: usize,
    pub type_counts: BTreeMap<String, usize>,
    pub replacements: BTreeMap<String, String>,
    pub passes: Vec<PassReport>,
}

/// Error body: `{ "error": { "code", "message" } }`
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

/// Redaction failure mapped to an HTTP status
struct HttpError(StatusCode, ApiError);

impl From<Error> for HttpError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Extraction(_) => HttpError(
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiError::new("PAYLOAD_TOO_LARGE", err.to_string()),
            ),
            Error::Redaction(_) | Error::Detector(_) => HttpError(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("REDACTION_FAILED", err.to_string()),
            ),
            _ => {
                tracing::error!(error = %err, "Redaction request failed");
                HttpError(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", "Internal error"),
                )
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/redact — extract and redact an uploaded PDF
async fn redact(
    State(state): State<RedactState>,
    Query(params): Query<RedactQuery>,
    body: Bytes,
) -> Result<Json<RedactResponse>, HttpError> {
    let mode = match params.mode.as_deref() {
        Some(raw) => Some(
            raw.parse::<RedactionMode>()
                .map_err(|e| HttpError(StatusCode::BAD_REQUEST, ApiError::bad_request(e)))?,
        ),
        None => None,
    };
    if body.is_empty() {
        return Err(HttpError(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request("Request body must be a PDF document"),
        ));
    }

    let pipeline = state.pipeline.clone();
    let effective_mode = mode.unwrap_or_else(|| pipeline.default_mode());
    let redaction = tokio::task::spawn_blocking(move || pipeline.redact_pdf(&body, mode))
        .await
        .map_err(|e| Error::Internal(format!("Redaction task failed: {}", e)))??;

    Ok(Json(RedactResponse {
        empty: redaction.is_empty(),
        mode: effective_mode,
        replacements_count: redaction.replacement_count(),
        type_counts: redaction.kind_counts(),
        replacements: redaction
            .replacements
            .as_ref()
            .map(|map| map.to_map())
            .unwrap_or_default(),
        passes: redaction.passes,
        redacted_text: redaction.text,
    }))
}
