// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Evaluation Service
//!
//! Runs one pairwise evaluation end to end: resolve model parameters, load
//! the task and its project's active template inside one store session,
//! fill the template, call the provider, and write the answer back.
//!
//! Every failure after request validation becomes an
//! `EvaluationOutcome::Failure`; nothing here returns an error to the caller.

use crate::domain::evaluation::{EvaluationError, EvaluationOutcome, EvaluationRequest};
use crate::domain::model_config::{ModelParameters, ModelRegistry};
use crate::domain::repository::{EvaluationSession, EvaluationStore};
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::prompt_template_engine::{PromptContext, PromptTemplateEngine};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[async_trait]
pub trait EvaluationService: Send + Sync {
    async fn evaluate(&self, request: EvaluationRequest) -> EvaluationOutcome;
}

pub struct StandardEvaluationService {
    models: Arc<ModelRegistry>,
    store: Arc<dyn EvaluationStore>,
    providers: Arc<ProviderRegistry>,
    templates: PromptTemplateEngine,
}

impl StandardEvaluationService {
    pub fn new(
        models: Arc<ModelRegistry>,
        store: Arc<dyn EvaluationStore>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            models,
            store,
            providers,
            templates: PromptTemplateEngine::new(),
        }
    }

    async fn run(&self, request: &EvaluationRequest) -> Result<String, EvaluationError> {
        // 1. Resolve parameters before touching the store
        let params = self
            .models
            .resolve(request.provider, &request.model_type)?
            .clone();

        // 2. One session per call; a session dropped mid-flight rolls back
        let mut session = self.store.begin().await?;

        match self.run_in_session(session.as_mut(), request, &params).await {
            Ok(response) => {
                session.commit().await?;
                Ok(response)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(task_id = request.task_id, error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn run_in_session(
        &self,
        session: &mut dyn EvaluationSession,
        request: &EvaluationRequest,
        params: &ModelParameters,
    ) -> Result<String, EvaluationError> {
        // 3. Task row
        let task = session
            .find_task(request.task_id)
            .await?
            .ok_or(EvaluationError::TaskNotFound(request.task_id))?;

        // 4. Question normalized as part of the context
        let context = PromptContext::from_task(&task);

        // 5. Active template for the task's project
        let template = session
            .find_active_template(task.project_id)
            .await?
            .ok_or(EvaluationError::NoActiveTemplate(task.project_id))?;

        // 6. Fill placeholders
        let prompt = self.templates.render(&template.content, &context)?;
        debug!(
            task_id = request.task_id,
            project_id = task.project_id,
            prompt_chars = prompt.len(),
            "Prompt rendered"
        );

        // 7. Single provider call
        let response = self
            .providers
            .generate(request.provider, &prompt, params)
            .await?;

        // 8. Write back; the caller commits
        session
            .save_response(request.task_id, request.provider, &response)
            .await?;

        Ok(response)
    }
}

#[async_trait]
impl EvaluationService for StandardEvaluationService {
    async fn evaluate(&self, request: EvaluationRequest) -> EvaluationOutcome {
        let started = Instant::now();
        info!(
            task_id = request.task_id,
            provider = %request.provider,
            model_type = %request.model_type,
            "Evaluation started"
        );

        let outcome = EvaluationOutcome::from(self.run(&request).await);

        let label = match &outcome {
            EvaluationOutcome::Success { response } => {
                info!(
                    task_id = request.task_id,
                    provider = %request.provider,
                    response_chars = response.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Evaluation completed"
                );
                "success"
            }
            EvaluationOutcome::Failure(e) => {
                warn!(
                    task_id = request.task_id,
                    provider = %request.provider,
                    kind = e.kind(),
                    error = %e,
                    "Evaluation failed"
                );
                e.kind()
            }
        };

        // Unknown model types share one label value
        let model_type = match self.models.resolve(request.provider, &request.model_type) {
            Ok(_) => request.model_type.to_lowercase(),
            Err(_) => "unsupported".to_string(),
        };
        metrics::counter!(
            "pairwise_evaluations_total",
            "provider" => request.provider.as_str(),
            "model_type" => model_type,
            "outcome" => label
        )
        .increment(1);

        outcome
    }
}
