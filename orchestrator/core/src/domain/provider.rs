// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Provider
//!
//! Closed set of text-generation providers the evaluator can call.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identify providers and the evaluation column each one owns

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External text-generation API identified by a short string key.
///
/// Adding a provider means adding a variant here, an adapter under
/// `infrastructure/llm/` and its rows in the model registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Gemini];

    /// Wire/config key ("openai", "gemini")
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
        }
    }

    /// Uppercase label used in provider error messages
    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI",
            Provider::Gemini => "GEMINI",
        }
    }

    /// Column of the evaluations table that receives this provider's answer
    pub fn response_column(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai_response",
            Provider::Gemini => "gemini_response",
        }
    }

    /// Default environment variable holding the API credential
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Comma-separated list of supported keys, e.g. for validation messages
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn test_response_columns_are_distinct() {
        assert_eq!(Provider::OpenAI.response_column(), "openai_response");
        assert_eq!(Provider::Gemini.response_column(), "gemini_response");
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(Provider::supported_list(), "openai, gemini");
    }
}
