// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Model Configuration Registry
//!
//! Maps a `(provider, model type)` pair to the generation parameters used for
//! that call. Model types are named tuning profiles: `text` is tuned for
//! low-temperature, short output and `reasoning` for higher-temperature,
//! longer output.
//!
//! The built-in table can be extended or overridden through `spec.models` in
//! the service configuration manifest. The registry is built once at startup
//! and shared read-only between requests.

use crate::domain::provider::Provider;
use crate::domain::service_config::EvaluatorConfigSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generation parameters for one `(provider, model type)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Model identifier sent to the provider API
    pub model: String,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum number of output tokens
    pub max_tokens: u32,

    /// Nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl ModelParameters {
    pub fn new(model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens,
            top_p: default_top_p(),
        }
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}

fn default_top_p() -> f32 {
    1.0
}

/// A `spec.models` entry in the configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOverride {
    pub provider: Provider,
    pub model_type: String,
    #[serde(flatten)]
    pub parameters: ModelParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported provider/type: {provider}/{model_type}")]
pub struct UnsupportedConfiguration {
    pub provider: String,
    pub model_type: String,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: BTreeMap<(Provider, String), ModelParameters>,
}

impl ModelRegistry {
    /// An empty registry; every lookup fails
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The parameter presets shipped with the service
    pub fn builtin() -> Self {
        Self::empty()
            .with_entry(
                Provider::OpenAI,
                "text",
                ModelParameters::new("gpt-3.5-turbo", 0.3, 512).with_top_p(0.9),
            )
            .with_entry(
                Provider::OpenAI,
                "reasoning",
                ModelParameters::new("gpt-4-turbo", 0.7, 1024).with_top_p(1.0),
            )
            .with_entry(
                Provider::Gemini,
                "text",
                ModelParameters::new("gemini-2.0-flash", 0.3, 2048),
            )
            .with_entry(
                Provider::Gemini,
                "reasoning",
                ModelParameters::new("gemini-pro", 0.7, 4096),
            )
    }

    /// Built-in table plus `spec.models`, restricted to enabled providers
    pub fn from_config(spec: &EvaluatorConfigSpec) -> Self {
        let mut registry = Self::builtin();

        for entry in &spec.models {
            tracing::info!(
                "Model override {}/{} -> {}",
                entry.provider,
                entry.model_type,
                entry.parameters.model
            );
            registry.insert(entry.provider, &entry.model_type, entry.parameters.clone());
        }

        registry
            .entries
            .retain(|(provider, _), _| spec.providers.is_enabled(*provider));

        registry
    }

    pub fn with_entry(
        mut self,
        provider: Provider,
        model_type: &str,
        parameters: ModelParameters,
    ) -> Self {
        self.insert(provider, model_type, parameters);
        self
    }

    fn insert(&mut self, provider: Provider, model_type: &str, parameters: ModelParameters) {
        self.entries
            .insert((provider, model_type.to_ascii_lowercase()), parameters);
    }

    /// Look up the parameters for a pair. Model types are matched case-insensitively.
    pub fn resolve(
        &self,
        provider: Provider,
        model_type: &str,
    ) -> Result<&ModelParameters, UnsupportedConfiguration> {
        self.entries
            .get(&(provider, model_type.to_ascii_lowercase()))
            .ok_or_else(|| UnsupportedConfiguration {
                provider: provider.to_string(),
                model_type: model_type.to_string(),
            })
    }

    /// Model types registered for a provider, sorted
    pub fn model_types(&self, provider: Provider) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|(p, _)| *p == provider)
            .map(|(_, t)| t.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
