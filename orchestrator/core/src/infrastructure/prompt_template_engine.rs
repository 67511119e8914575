// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Template Engine
//!
//! Fills stored comparison templates with the two candidate responses and the
//! user question.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Transform templates with placeholders into final prompts
//! - **Integration:** prompt templates table → provider prompt
//!
//! # Syntax
//!
//! Templates use single-brace named fields:
//!
//! - `{left_response}` - first candidate response
//! - `{right_response}` - second candidate response
//! - `{user_question}` - the question both candidates answered
//!
//! `{{` and `}}` produce literal braces. Anything else inside braces
//! (unknown names, positional `{}`/`{0}`, conversions or format specs) is
//! rejected instead of being passed through.
//!
//! # Usage
//!
//! ```ignore
//! let engine = PromptTemplateEngine::new();
//! let context = PromptContext::new()
//!     .left_response("foo")
//!     .right_response("bar")
//!     .user_question("why?");
//! let prompt = engine.render("Q: {user_question}\nA: {left_response} vs {right_response}", &context)?;
//! ```

use crate::domain::evaluation::EvaluationTask;
pub use crate::domain::prompt_template::TemplateFormatError;

// ============================================================================
// Template Context
// ============================================================================

/// Values available to a comparison template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub left_response: String,
    pub right_response: String,
    pub user_question: String,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a task; the question is normalized to text
    pub fn from_task(task: &EvaluationTask) -> Self {
        Self {
            left_response: task.left_response.clone(),
            right_response: task.right_response.clone(),
            user_question: task.user_question.normalize(),
        }
    }

    pub fn left_response(mut self, value: impl Into<String>) -> Self {
        self.left_response = value.into();
        self
    }

    pub fn right_response(mut self, value: impl Into<String>) -> Self {
        self.right_response = value.into();
        self
    }

    pub fn user_question(mut self, value: impl Into<String>) -> Self {
        self.user_question = value.into();
        self
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "left_response" => Some(&self.left_response),
            "right_response" => Some(&self.right_response),
            "user_question" => Some(&self.user_question),
            _ => None,
        }
    }
}

// ============================================================================
// Template Engine
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PromptTemplateEngine;

impl PromptTemplateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &PromptContext) -> Result<String, TemplateFormatError> {
        let mut out = String::with_capacity(template.len() + 256);
        self.walk(template, |piece| {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Char(c) => out.push(c),
                Piece::Field(name) => {
                    let value = context
                        .lookup(name)
                        .ok_or_else(|| TemplateFormatError::UnknownPlaceholder(name.to_string()))?;
                    out.push_str(value);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }

    fn walk<'t, F>(&self, template: &'t str, mut visit: F) -> Result<(), TemplateFormatError>
    where
        F: FnMut(Piece<'t>) -> Result<(), TemplateFormatError>,
    {
        let bytes = template.as_bytes();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    visit(Piece::Literal(&template[literal_start..i]))?;
                    if bytes.get(i + 1) == Some(&b'{') {
                        visit(Piece::Char('{'))?;
                        i += 2;
                    } else {
                        let open = i;
                        let rest = &template[open + 1..];
                        let close = rest
                            .find('}')
                            .ok_or(TemplateFormatError::UnclosedPlaceholder(open))?;
                        let field = &rest[..close];
                        if field.contains('{') {
                            return Err(TemplateFormatError::NestedBrace(open));
                        }
                        visit(Piece::Field(Self::field_name(field)?))?;
                        i = open + 1 + close + 1;
                    }
                    literal_start = i;
                }
                b'}' => {
                    visit(Piece::Literal(&template[literal_start..i]))?;
                    if bytes.get(i + 1) == Some(&b'}') {
                        visit(Piece::Char('}'))?;
                        i += 2;
                    } else {
                        return Err(TemplateFormatError::UnmatchedClosingBrace(i));
                    }
                    literal_start = i;
                }
                _ => i += 1,
            }
        }

        visit(Piece::Literal(&template[literal_start..]))
    }

    fn field_name(field: &str) -> Result<&str, TemplateFormatError> {
        if field.contains(':') || field.contains('!') {
            return Err(TemplateFormatError::UnsupportedFormatSpec(field.to_string()));
        }
        if field.is_empty() || field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TemplateFormatError::PositionalPlaceholder(field.to_string()));
        }
        Ok(field)
    }
}

enum Piece<'t> {
    Literal(&'t str),
    Char(char),
    Field(&'t str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::UserQuestion;

    fn context() -> PromptContext {
        PromptContext::new()
            .left_response("foo")
            .right_response("bar")
            .user_question("why?")
    }

    #[test]
    fn test_named_substitution() {
        let engine = PromptTemplateEngine::new();
        let prompt = engine
            .render("Q: {user_question}\nA: {left_response} vs {right_response}", &context())
            .unwrap();
        assert_eq!(prompt, "Q: why?\nA: foo vs bar");
    }

    #[test]
    fn test_repeated_and_unused_placeholders() {
        let engine = PromptTemplateEngine::new();
        let prompt = engine.render("{left_response}/{left_response}", &context()).unwrap();
        assert_eq!(prompt, "foo/foo");
    }

    #[test]
    fn test_escaped_braces() {
        let engine = PromptTemplateEngine::new();
        let prompt = engine
            .render("Reply as {{\"winner\": \"left\"}} for {user_question}", &context())
            .unwrap();
        assert_eq!(prompt, "Reply as {\"winner\": \"left\"} for why?");
    }

    #[test]
    fn test_substituted_values_are_not_reparsed() {
        let engine = PromptTemplateEngine::new();
        let ctx = context().left_response("{right_response}");
        assert_eq!(engine.render("{left_response}", &ctx).unwrap(), "{right_response}");
    }

    #[test]
    fn test_unknown_placeholder() {
        let engine = PromptTemplateEngine::new();
        let err = engine.render("Judge {candidate_a}", &context()).unwrap_err();
        assert_eq!(err, TemplateFormatError::UnknownPlaceholder("candidate_a".to_string()));
        assert_eq!(err.to_string(), "unknown placeholder 'candidate_a'");
    }

    #[test]
    fn test_malformed_templates() {
        let engine = PromptTemplateEngine::new();
        assert_eq!(
            engine.render("open {left_response", &context()).unwrap_err(),
            TemplateFormatError::UnclosedPlaceholder(5)
        );
        assert_eq!(
            engine.render("close }", &context()).unwrap_err(),
            TemplateFormatError::UnmatchedClosingBrace(6)
        );
        assert!(matches!(
            engine.render("{}", &context()).unwrap_err(),
            TemplateFormatError::PositionalPlaceholder(_)
        ));
        assert!(matches!(
            engine.render("{0}", &context()).unwrap_err(),
            TemplateFormatError::PositionalPlaceholder(_)
        ));
        assert!(matches!(
            engine.render("{left_response:>10}", &context()).unwrap_err(),
            TemplateFormatError::UnsupportedFormatSpec(_)
        ));
        assert!(matches!(
            engine.render("{left_{x}", &context()).unwrap_err(),
            TemplateFormatError::NestedBrace(0)
        ));
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let engine = PromptTemplateEngine::new();
        let ctx = context().user_question("¿por qué? 🚀");
        assert_eq!(
            engine.render("«{user_question}» - {{ok}}", &ctx).unwrap(),
            "«¿por qué? 🚀» - {ok}"
        );
    }

    #[test]
    fn test_context_from_task_normalizes_question() {
        let task = EvaluationTask {
            task_id: 1,
            left_response: "a".to_string(),
            right_response: "b".to_string(),
            user_question: UserQuestion::from_json(serde_json::json!({"q": "why"})),
            project_id: 9,
        };
        let ctx = PromptContext::from_task(&task);
        assert_eq!(ctx.user_question, r#"{"q": "why"}"#);
    }
}
