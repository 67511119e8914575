// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// One adapter per Provider variant. Each adapter translates between our
// domain interface and the vendor API; the registry dispatches on Provider.

pub mod gemini;
pub mod openai;
pub mod registry;

pub use registry::ProviderRegistry;

use crate::domain::llm::LLMError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to a domain error
pub(crate) fn error_for_status(status: StatusCode, error_text: String, model: &str) -> LLMError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        LLMError::Authentication(error_text)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        LLMError::RateLimit
    } else if status == StatusCode::NOT_FOUND {
        LLMError::ModelNotFound(model.to_string())
    } else {
        LLMError::Provider(format!("HTTP {}: {}", status, error_text))
    }
}

/// Best-effort error message from a failed response. Both vendors wrap
/// errors as `{"error": {"message": ..}}`; fall back to the raw body.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, "bad key".into(), "m"),
            LLMError::Authentication(msg) if msg == "bad key"
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, String::new(), "m"),
            LLMError::RateLimit
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LLMError::ModelNotFound(model) if model == "gpt-x"
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_GATEWAY, "upstream".into(), "m"),
            LLMError::Provider(msg) if msg.contains("502") && msg.contains("upstream")
        ));
    }
}
