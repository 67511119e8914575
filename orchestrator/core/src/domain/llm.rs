// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provides the provider-neutral generation interface.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer between the evaluator and vendor APIs

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Each supported provider gets one adapter in infrastructure/llm/.
// Vendor request/response types never leave their adapter; callers only see
// GenerationResponse and LLMError. The registry folds LLMError into
// ProviderError before it reaches the orchestrator.

use crate::domain::model_config::ModelParameters;
use crate::domain::provider::Provider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// System instruction sent with every comparison prompt
pub const COMPARATIVE_EVALUATOR_INSTRUCTION: &str = "You are an expert at comparative analysis.";

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM. Exactly one outbound call.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;
}

/// Options for LLM generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier for the provider API
    pub model: String,

    /// Instruction framing the conversation
    pub system_instruction: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Nucleus sampling
    pub top_p: f32,
}

impl GenerationOptions {
    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self {
            model: params.model.clone(),
            system_instruction: COMPARATIVE_EVALUATOR_INSTRUCTION.to_string(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text, untrimmed
    pub text: String,

    /// Token usage stats
    pub usage: TokenUsage,

    /// Model reported by the provider
    pub model: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter / safety settings
    ContentFilter,

    /// Anything the provider reports that we don't model
    Other(String),
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Single error type the orchestrator sees for any provider failure
#[derive(Debug, thiserror::Error)]
#[error("{} API error: {message}", provider.label())]
pub struct ProviderError {
    pub provider: Provider,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            provider,
            message: message.into(),
        }
    }

    pub fn wrap(provider: Provider, source: LLMError) -> Self {
        Self::new(provider, source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_carry_parameters_and_instruction() {
        let params = ModelParameters::new("gpt-4-turbo", 0.7, 1024).with_top_p(0.95);
        let options = GenerationOptions::from_parameters(&params);
        assert_eq!(options.model, "gpt-4-turbo");
        assert_eq!(options.max_tokens, 1024);
        assert_eq!(options.top_p, 0.95);
        assert_eq!(options.system_instruction, COMPARATIVE_EVALUATOR_INSTRUCTION);
    }

    #[test]
    fn test_provider_error_names_provider() {
        let err = ProviderError::wrap(Provider::Gemini, LLMError::RateLimit);
        assert_eq!(err.to_string(), "GEMINI API error: Rate limit exceeded");
    }
}
