// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running evaluation service

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

use pairwise_core::domain::evaluation::EvaluationRequest;

use super::base_url;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

/// Status code and JSON body returned by `POST /ai`
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    pub status: u16,
    pub body: Value,
}

impl RemoteOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl ServiceClient {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url(host, port),
        })
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<RemoteOutcome> {
        let response = self
            .client
            .post(format!("{}/ai", self.base_url))
            .json(&json!({
                "task_id": request.task_id,
                "ai_model": request.provider.as_str(),
                "model_type": request.model_type,
            }))
            .send()
            .await
            .context("Failed to reach evaluation service")?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .context("Evaluation service returned a non-JSON body")?;

        Ok(RemoteOutcome { status, body })
    }
}
