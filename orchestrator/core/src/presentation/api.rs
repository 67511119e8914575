// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/ai` | Run one pairwise evaluation |
//! | GET | `/health` | Liveness probe |
//!
//! Request validation happens here and answers 400 before the evaluation
//! service is called. Every failure outcome answers 500 with the failure
//! message; a panic anywhere below the router answers a generic 500.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::evaluation::EvaluationService;
use crate::domain::evaluation::{EvaluationOutcome, EvaluationRequest};
use crate::domain::provider::Provider;

pub const DEFAULT_PROVIDER: Provider = Provider::OpenAI;
pub const DEFAULT_MODEL_TYPE: &str = "text";

pub struct AppState {
    pub evaluation_service: Arc<dyn EvaluationService>,
    pub start_time: Instant,
}

pub fn app(service: Arc<dyn EvaluationService>) -> Router {
    let state = Arc::new(AppState {
        evaluation_service: service,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/ai", post(evaluate))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Rejected request, answered with 400 before any work begins
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No data provided")]
    NoData,

    #[error("Valid integer Task ID required")]
    InvalidTaskId,

    #[error("Supported models: {}", Provider::supported_list())]
    UnsupportedProvider,

    #[error("model_type must be a string")]
    InvalidModelType,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Parse the raw request body into an evaluation request.
///
/// `ai_model` and `model_type` default when absent or null. An empty JSON
/// object counts as no data.
pub fn parse_request(body: &[u8]) -> Result<EvaluationRequest, ValidationError> {
    let data: Map<String, Value> = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ValidationError::NoData),
    };

    // Integers only: floats, numeric strings and booleans are rejected
    let task_id = data
        .get("task_id")
        .and_then(Value::as_i64)
        .ok_or(ValidationError::InvalidTaskId)?;

    let provider = match data.get("ai_model") {
        None | Some(Value::Null) => DEFAULT_PROVIDER,
        Some(Value::String(name)) => name
            .parse::<Provider>()
            .map_err(|_| ValidationError::UnsupportedProvider)?,
        Some(_) => return Err(ValidationError::UnsupportedProvider),
    };

    let model_type = match data.get("model_type") {
        None | Some(Value::Null) => DEFAULT_MODEL_TYPE.to_string(),
        Some(Value::String(model_type)) => model_type.to_lowercase(),
        Some(_) => return Err(ValidationError::InvalidModelType),
    };

    Ok(EvaluationRequest::new(task_id, provider, model_type))
}

async fn evaluate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let outcome = state.evaluation_service.evaluate(request).await;
    let status = match &outcome {
        EvaluationOutcome::Success { .. } => StatusCode::OK,
        EvaluationOutcome::Failure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(outcome.to_json())).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    error!(panic = detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
