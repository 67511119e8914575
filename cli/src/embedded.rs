// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedded mode evaluation (when the HTTP service is not running)
//!
//! Builds the evaluation service in-process from a validated configuration.
//! The HTTP service uses the same wiring.

use anyhow::{Context, Result};
use std::sync::Arc;

use pairwise_core::{
    application::evaluation::{EvaluationService, StandardEvaluationService},
    domain::{
        evaluation::{EvaluationOutcome, EvaluationRequest},
        model_config::ModelRegistry,
        service_config::EvaluatorConfigManifest,
    },
    infrastructure::{llm::ProviderRegistry, repositories::create_evaluation_store},
};

pub struct EmbeddedEvaluator {
    service: Arc<StandardEvaluationService>,
}

impl EmbeddedEvaluator {
    pub fn new(config: &EvaluatorConfigManifest) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let spec = &config.spec;
        let models = Arc::new(ModelRegistry::from_config(spec));
        let store = create_evaluation_store(spec).context("Failed to initialize evaluation store")?;
        let providers = Arc::new(
            ProviderRegistry::from_config(spec).context("Failed to initialize LLM providers")?,
        );

        Ok(Self {
            service: Arc::new(StandardEvaluationService::new(models, store, providers)),
        })
    }

    pub fn service(&self) -> Arc<dyn EvaluationService> {
        self.service.clone()
    }

    pub async fn evaluate(&self, request: EvaluationRequest) -> EvaluationOutcome {
        self.service.evaluate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_core::domain::provider::Provider;
    use pairwise_core::domain::service_config::StoreBackendKind;

    fn in_memory_config() -> EvaluatorConfigManifest {
        let mut config = EvaluatorConfigManifest::default();
        config.spec.database.backend = StoreBackendKind::InMemory;
        config
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = in_memory_config();
        config.spec.tables.evaluations = "tasks; DROP TABLE tasks".to_string();
        assert!(EmbeddedEvaluator::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_missing_task_in_empty_store() {
        let evaluator = EmbeddedEvaluator::new(&in_memory_config()).unwrap();
        let outcome = evaluator
            .evaluate(EvaluationRequest::new(1, Provider::OpenAI, "text"))
            .await;
        assert_eq!(outcome.error().map(|e| e.to_string()).as_deref(), Some("Task 1 not found"));
    }
}
