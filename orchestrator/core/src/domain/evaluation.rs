// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Evaluation Domain
//!
//! Value objects for one pairwise evaluation: the task row read from the
//! store, the active prompt template of its project, the request that kicks
//! the evaluation off and the outcome returned to the caller.
//!
//! Every failure the orchestrator can hit is an [`EvaluationError`] variant.
//! None of them escape as faults; they are folded into
//! [`EvaluationOutcome::Failure`] and the caller decides how to surface them.

use crate::domain::llm::ProviderError;
use crate::domain::model_config::UnsupportedConfiguration;
use crate::domain::prompt_template::TemplateFormatError;
use crate::domain::provider::Provider;
use crate::domain::repository::RepositoryError;
use serde::{Deserialize, Serialize};
use std::io;

/// Identifier of a row in the evaluations table
pub type TaskId = i64;

/// Identifier of the project owning tasks and templates
pub type ProjectId = i64;

/// The final user question as stored: plain text or a structured JSON value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserQuestion {
    Text(String),
    Structured(serde_json::Value),
}

impl UserQuestion {
    /// Build from a JSON column value. JSON strings stay text.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }

    /// Text form used in the prompt. Structured values keep their key order
    /// and are written with `", "` and `": "` separators, non-ASCII escaped.
    pub fn normalize(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => spaced_json(value),
        }
    }
}

fn spaced_json(value: &serde_json::Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Single-line JSON with a space after each separator and every character
/// outside printable ASCII written as `\uXXXX`
struct SpacedAsciiFormatter;

impl serde_json::ser::Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for UserQuestion {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A pairwise evaluation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTask {
    pub task_id: TaskId,
    pub left_response: String,
    pub right_response: String,
    pub user_question: UserQuestion,
    pub project_id: ProjectId,
}

/// The active prompt template of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub project_id: ProjectId,
    pub content: String,
}

/// Inputs of one evaluation, already validated by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub task_id: TaskId,
    pub provider: Provider,
    pub model_type: String,
}

impl EvaluationRequest {
    pub fn new(task_id: TaskId, provider: Provider, model_type: impl Into<String>) -> Self {
        Self {
            task_id,
            provider,
            model_type: model_type.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    UnsupportedConfiguration(#[from] UnsupportedConfiguration),

    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    #[error("No active template found")]
    NoActiveTemplate(ProjectId),

    #[error("Template formatting error: {0}")]
    TemplateFormat(#[from] TemplateFormatError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
}

impl EvaluationError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedConfiguration(_) => "unsupported_configuration",
            Self::TaskNotFound(_) | Self::NoActiveTemplate(_) => "not_found",
            Self::TemplateFormat(_) => "template_format",
            Self::Provider(_) => "provider",
            Self::Store(_) => "store",
        }
    }
}

/// Result of one evaluation as handed back to the caller
#[derive(Debug)]
pub enum EvaluationOutcome {
    Success { response: String },
    Failure(EvaluationError),
}

impl EvaluationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Success { response } => Some(response),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EvaluationError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(e) => Some(e),
        }
    }

    /// `{"status": "success", "response": ..}` or `{"error": ..}`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Success { response } => serde_json::json!({
                "status": "success",
                "response": response,
            }),
            Self::Failure(e) => serde_json::json!({ "error": e.to_string() }),
        }
    }
}

impl From<Result<String, EvaluationError>> for EvaluationOutcome {
    fn from(result: Result<String, EvaluationError>) -> Self {
        match result {
            Ok(response) => Self::Success { response },
            Err(e) => Self::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_question_is_verbatim() {
        let question = UserQuestion::from_json(json!("why is the sky blue?"));
        assert_eq!(question.normalize(), "why is the sky blue?");
    }

    #[test]
    fn test_structured_question_keeps_key_order_and_spacing() {
        let question = UserQuestion::from_json(json!({"question": "which?", "lang": "rust"}));
        assert_eq!(question.normalize(), r#"{"question": "which?", "lang": "rust"}"#);

        let nested = UserQuestion::from_json(json!({"topic": "rust", "turns": [1, 2], "meta": {}}));
        assert_eq!(nested.normalize(), r#"{"topic": "rust", "turns": [1, 2], "meta": {}}"#);
    }

    #[test]
    fn test_structured_question_escapes_non_ascii() {
        let question = UserQuestion::from_json(json!(["café", "🚀", "tab\there", "quote\""]));
        assert_eq!(
            question.normalize(),
            r#"["caf\u00e9", "\ud83d\ude80", "tab\there", "quote\""]"#
        );
    }

    #[test]
    fn test_outcome_json_shapes() {
        let ok = EvaluationOutcome::from(Ok("left wins".to_string()));
        assert_eq!(ok.to_json(), json!({"status": "success", "response": "left wins"}));

        let failed = EvaluationOutcome::from(Err(EvaluationError::TaskNotFound(7)));
        assert_eq!(failed.to_json(), json!({"error": "Task 7 not found"}));
        assert_eq!(failed.error().unwrap().kind(), "not_found");
        assert!(failed.response().is_none());
    }

    #[test]
    fn test_unsupported_configuration_message() {
        let err = EvaluationError::from(UnsupportedConfiguration {
            provider: "openai".to_string(),
            model_type: "vision".to_string(),
        });
        assert_eq!(err.to_string(), "Unsupported provider/type: openai/vision");
        assert_eq!(err.kind(), "unsupported_configuration");
    }
}
