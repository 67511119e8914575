// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pairwise_core::application::evaluation::EvaluationService;
use pairwise_core::domain::evaluation::{EvaluationError, EvaluationOutcome, EvaluationRequest};
use pairwise_core::domain::provider::Provider;
use pairwise_core::presentation::api::app;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

enum Behaviour {
    Succeed(&'static str),
    TaskMissing,
    Panic,
}

struct MockEvaluationService {
    behaviour: Behaviour,
    requests: Mutex<Vec<EvaluationRequest>>,
}

impl MockEvaluationService {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl EvaluationService for MockEvaluationService {
    async fn evaluate(&self, request: EvaluationRequest) -> EvaluationOutcome {
        let task_id = request.task_id;
        self.requests.lock().push(request);
        match self.behaviour {
            Behaviour::Succeed(text) => EvaluationOutcome::Success {
                response: text.to_string(),
            },
            Behaviour::TaskMissing => EvaluationOutcome::Failure(EvaluationError::TaskNotFound(task_id)),
            Behaviour::Panic => panic!("store driver exploded"),
        }
    }
}

async fn post_ai(service: Arc<MockEvaluationService>, body: &str) -> (StatusCode, Value) {
    let response = app(service)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ai")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_success_returns_200_with_response() {
    let service = MockEvaluationService::new(Behaviour::Succeed("Left wins."));
    let (status, body) = post_ai(
        service.clone(),
        r#"{"task_id": 42, "ai_model": "gemini", "model_type": "reasoning"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "response": "Left wins."}));

    let requests = service.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].task_id, 42);
    assert_eq!(requests[0].provider, Provider::Gemini);
    assert_eq!(requests[0].model_type, "reasoning");
}

#[tokio::test]
async fn test_defaults_for_provider_and_model_type() {
    let service = MockEvaluationService::new(Behaviour::Succeed("ok"));
    let (status, _) = post_ai(service.clone(), r#"{"task_id": 1}"#).await;

    assert_eq!(status, StatusCode::OK);
    let requests = service.requests.lock();
    assert_eq!(requests[0].provider, Provider::OpenAI);
    assert_eq!(requests[0].model_type, "text");
}

#[tokio::test]
async fn test_non_integer_task_id_is_rejected_before_evaluation() {
    let service = MockEvaluationService::new(Behaviour::Succeed("unused"));
    for body in [r#"{"task_id": "abc"}"#, r#"{"task_id": 1.5}"#, r#"{"ai_model": "openai"}"#] {
        let (status, json_body) = post_ai(service.clone(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body, json!({"error": "Valid integer Task ID required"}));
    }
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_missing_body_is_rejected() {
    let service = MockEvaluationService::new(Behaviour::Succeed("unused"));
    let (status, body) = post_ai(service.clone(), "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No data provided"}));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_provider_is_rejected() {
    let service = MockEvaluationService::new(Behaviour::Succeed("unused"));
    let (status, body) = post_ai(service.clone(), r#"{"task_id": 1, "ai_model": "mistral"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Supported models: openai, gemini"}));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_failure_outcome_returns_500_with_message() {
    let service = MockEvaluationService::new(Behaviour::TaskMissing);
    let (status, body) = post_ai(service.clone(), r#"{"task_id": 77}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Task 77 not found"}));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_panic_returns_generic_500() {
    let service = MockEvaluationService::new(Behaviour::Panic);
    let (status, body) = post_ai(service, r#"{"task_id": 1}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_health() {
    let service = MockEvaluationService::new(Behaviour::Succeed("unused"));
    let response = app(service)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].is_u64());
}
