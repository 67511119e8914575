// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Provider dispatch
//
// Holds one adapter per enabled Provider and exposes the single entry point
// the orchestrator uses. Every adapter failure leaves here as ProviderError.
// A failed call is a failed evaluation: no retries, no fallback provider.

use crate::domain::llm::{GenerationOptions, LLMError, LLMProvider, ProviderError};
use crate::domain::model_config::ModelParameters;
use crate::domain::provider::Provider;
use crate::domain::service_config::{CredentialSource, EvaluatorConfigSpec};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::gemini::GeminiAdapter;
use super::openai::OpenAIAdapter;

/// Registry for managing LLM provider adapters
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create adapters for every enabled provider in the configuration
    pub fn from_config(spec: &EvaluatorConfigSpec) -> anyhow::Result<Self> {
        info!("Initializing LLM provider registry");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(spec.request_timeout_secs))
            .build()?;

        let mut registry = Self::new();
        for provider in Provider::ALL {
            let config = spec.providers.get(provider);
            if !config.enabled {
                info!("Provider '{}' disabled, skipping", provider);
                continue;
            }

            info!("Initializing provider: {} ({})", provider, config.endpoint);
            let credential = CredentialSource::parse(&config.api_key);
            let adapter = Self::create_adapter(provider, client.clone(), config.endpoint.clone(), credential);
            registry = registry.with_adapter(provider, adapter);
        }

        if registry.adapters.is_empty() {
            warn!("No LLM providers enabled - every evaluation will fail");
        }

        Ok(registry)
    }

    fn create_adapter(
        provider: Provider,
        client: reqwest::Client,
        endpoint: String,
        credential: CredentialSource,
    ) -> Arc<dyn LLMProvider> {
        match provider {
            Provider::OpenAI => Arc::new(OpenAIAdapter::new(client, endpoint, credential)),
            Provider::Gemini => Arc::new(GeminiAdapter::new(client, endpoint, credential)),
        }
    }

    /// Register (or replace) the adapter for a provider
    pub fn with_adapter(mut self, provider: Provider, adapter: Arc<dyn LLMProvider>) -> Self {
        self.adapters.insert(provider, adapter);
        self
    }

    pub fn has_provider(&self, provider: Provider) -> bool {
        self.adapters.contains_key(&provider)
    }

    /// Enabled providers, in declaration order
    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    /// Generate text for a filled prompt. The returned text is trimmed.
    pub async fn generate(
        &self,
        provider: Provider,
        prompt: &str,
        params: &ModelParameters,
    ) -> Result<String, ProviderError> {
        if prompt.trim().is_empty() {
            return Err(ProviderError::wrap(
                provider,
                LLMError::InvalidInput("prompt is empty".into()),
            ));
        }

        let adapter = self.adapters.get(&provider).ok_or_else(|| {
            ProviderError::new(provider, format!("Provider '{}' is not configured", provider))
        })?;

        let options = GenerationOptions::from_parameters(params);
        debug!(
            provider = %provider,
            model = %options.model,
            prompt_chars = prompt.len(),
            "Calling provider"
        );

        let started = Instant::now();
        let result = adapter.generate(prompt, &options).await;
        metrics::histogram!("pairwise_provider_latency_seconds", "provider" => provider.as_str())
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                info!(
                    provider = %provider,
                    model = %response.model,
                    total_tokens = response.usage.total_tokens,
                    finish_reason = ?response.finish_reason,
                    "Generation successful"
                );
                Ok(response.text.trim().to_string())
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Generation failed");
                metrics::counter!("pairwise_provider_errors_total", "provider" => provider.as_str())
                    .increment(1);
                Err(ProviderError::wrap(provider, e))
            }
        }
    }
}
