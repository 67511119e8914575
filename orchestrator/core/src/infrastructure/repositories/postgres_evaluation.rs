// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Evaluation Store
//!
//! Production `EvaluationStore` backed by two externally owned tables:
//!
//! - the evaluation table (`task_id`, `left_response`, `right_response`,
//!   `final_user_question`, `project_id`, `openai_response`, `gemini_response`)
//! - the prompt template table (`project_id`, `template_content`, `is_active`,
//!   a creation-order column and a unique id column)
//!
//! Table and column names come from configuration and are checked as SQL
//! identifiers by `EvaluatorConfigManifest::validate` before they reach this
//! module. Every value is bound as a parameter.
//!
//! Each session checks out one pooled connection and opens one transaction.
//! A session dropped without `commit` rolls back when the transaction drops.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{Row, Transaction};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::evaluation::{EvaluationTask, PromptTemplate, ProjectId, TaskId, UserQuestion};
use crate::domain::provider::Provider;
use crate::domain::repository::{EvaluationSession, EvaluationStore, RepositoryError};
use crate::domain::service_config::TableConfig;

/// SQL text for one table configuration
#[derive(Debug, Clone)]
pub(crate) struct EvaluationQueries {
    find_task: String,
    find_active_template: String,
    save_openai: String,
    save_gemini: String,
}

impl EvaluationQueries {
    pub(crate) fn new(tables: &TableConfig) -> Self {
        let save = |provider: Provider| {
            format!(
                "UPDATE {} SET {} = $1 WHERE task_id = $2",
                tables.evaluations,
                provider.response_column()
            )
        };

        Self {
            find_task: format!(
                "SELECT left_response, right_response, final_user_question, project_id \
                 FROM {} WHERE task_id = $1",
                tables.evaluations
            ),
            // LIMIT 2 so a second active row can be reported
            find_active_template: format!(
                "SELECT template_content FROM {} \
                 WHERE project_id = $1 AND is_active = TRUE \
                 ORDER BY {} DESC NULLS LAST, {} DESC LIMIT 2",
                tables.prompt_templates, tables.template_order_column, tables.template_id_column
            ),
            save_openai: save(Provider::OpenAI),
            save_gemini: save(Provider::Gemini),
        }
    }

    fn save_response(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAI => &self.save_openai,
            Provider::Gemini => &self.save_gemini,
        }
    }
}

pub struct PostgresEvaluationStore {
    pool: PgPool,
    queries: Arc<EvaluationQueries>,
}

impl PostgresEvaluationStore {
    pub fn new(pool: PgPool, tables: &TableConfig) -> Self {
        Self {
            pool,
            queries: Arc::new(EvaluationQueries::new(tables)),
        }
    }
}

#[async_trait]
impl EvaluationStore for PostgresEvaluationStore {
    async fn begin(&self) -> Result<Box<dyn EvaluationSession>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        Ok(Box::new(PostgresEvaluationSession {
            tx,
            queries: self.queries.clone(),
        }))
    }
}

pub struct PostgresEvaluationSession {
    tx: Transaction<'static, Postgres>,
    queries: Arc<EvaluationQueries>,
}

#[async_trait]
impl EvaluationSession for PostgresEvaluationSession {
    async fn find_task(&mut self, task_id: TaskId) -> Result<Option<EvaluationTask>, RepositoryError> {
        let row = sqlx::query(&self.queries.find_task)
            .bind(task_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to load task {}: {}", task_id, e)))?;

        row.map(|row| decode_task(task_id, &row)).transpose()
    }

    async fn find_active_template(
        &mut self,
        project_id: ProjectId,
    ) -> Result<Option<PromptTemplate>, RepositoryError> {
        let rows = sqlx::query(&self.queries.find_active_template)
            .bind(project_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to load template for project {}: {}",
                    project_id, e
                ))
            })?;

        if rows.len() > 1 {
            warn!(
                project_id,
                "Multiple active templates for project, using the most recently created"
            );
        }

        rows.first()
            .map(|row| {
                let content: Option<String> = row
                    .try_get("template_content")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(PromptTemplate {
                    project_id,
                    content: content.unwrap_or_default(),
                })
            })
            .transpose()
    }

    async fn save_response(
        &mut self,
        task_id: TaskId,
        provider: Provider,
        response: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(self.queries.save_response(provider))
            .bind(response)
            .bind(task_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to write {} for task {}: {}",
                    provider.response_column(),
                    task_id,
                    e
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("task {}", task_id)));
        }

        debug!(task_id, column = provider.response_column(), "Response staged");
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let session = *self;
        session
            .tx
            .commit()
            .await
            .map_err(|e| RepositoryError::Database(format!("Commit failed: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        let session = *self;
        session
            .tx
            .rollback()
            .await
            .map_err(|e| RepositoryError::Database(format!("Rollback failed: {}", e)))
    }
}

fn decode_task(task_id: TaskId, row: &PgRow) -> Result<EvaluationTask, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let left_response: Option<String> = row.try_get("left_response").map_err(decode)?;
    let right_response: Option<String> = row.try_get("right_response").map_err(decode)?;

    let user_question = question_from_columns(row.try_get("final_user_question"), || {
        row.try_get("final_user_question")
    })?;
    let project_id = project_id_from_columns(row.try_get("project_id"), || row.try_get("project_id"))?;

    Ok(EvaluationTask {
        task_id,
        left_response: left_response.unwrap_or_default(),
        right_response: right_response.unwrap_or_default(),
        user_question,
        project_id,
    })
}

/// The question column may be JSON or plain text; the text decode only runs
/// when the JSON decode fails. NULL becomes an empty question.
fn question_from_columns(
    as_json: Result<Option<serde_json::Value>, sqlx::Error>,
    as_text: impl FnOnce() -> Result<Option<String>, sqlx::Error>,
) -> Result<UserQuestion, RepositoryError> {
    match as_json {
        Ok(value) => Ok(value.map(UserQuestion::from_json).unwrap_or_default()),
        Err(_) => Ok(as_text()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            .map(UserQuestion::Text)
            .unwrap_or_default()),
    }
}

/// `project_id` may be int8 or int4
fn project_id_from_columns(
    wide: Result<i64, sqlx::Error>,
    narrow: impl FnOnce() -> Result<i32, sqlx::Error>,
) -> Result<ProjectId, RepositoryError> {
    match wide {
        Ok(id) => Ok(id),
        Err(_) => narrow()
            .map(i64::from)
            .map_err(|e| RepositoryError::Decode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_use_configured_tables() {
        let tables = TableConfig {
            evaluations: "analytics.pairwise_evaluations".to_string(),
            prompt_templates: "analytics.prompt_templates".to_string(),
            template_order_column: "updated_at".to_string(),
            template_id_column: "template_id".to_string(),
        };
        let queries = EvaluationQueries::new(&tables);

        assert_eq!(
            queries.find_task,
            "SELECT left_response, right_response, final_user_question, project_id \
             FROM analytics.pairwise_evaluations WHERE task_id = $1"
        );
        assert!(queries
            .find_active_template
            .starts_with("SELECT template_content FROM analytics.prompt_templates "));
        assert!(queries
            .find_active_template
            .ends_with("ORDER BY updated_at DESC NULLS LAST, template_id DESC LIMIT 2"));
    }

    #[test]
    fn test_each_provider_writes_only_its_column() {
        let queries = EvaluationQueries::new(&TableConfig::default());
        assert_eq!(
            queries.save_response(Provider::OpenAI),
            "UPDATE pairwise_evaluations SET openai_response = $1 WHERE task_id = $2"
        );
        assert_eq!(
            queries.save_response(Provider::Gemini),
            "UPDATE pairwise_evaluations SET gemini_response = $1 WHERE task_id = $2"
        );
    }

    fn mismatch() -> sqlx::Error {
        sqlx::Error::ColumnDecode {
            index: "\"final_user_question\"".to_string(),
            source: "mismatched types".into(),
        }
    }

    #[test]
    fn test_json_question_column() {
        let text_never_read = || -> Result<Option<String>, sqlx::Error> {
            panic!("text decode after JSON success")
        };

        let structured =
            question_from_columns(Ok(Some(serde_json::json!({"q": "why"}))), text_never_read).unwrap();
        assert_eq!(structured, UserQuestion::Structured(serde_json::json!({"q": "why"})));

        let string =
            question_from_columns(Ok(Some(serde_json::json!("why"))), text_never_read).unwrap();
        assert_eq!(string, UserQuestion::Text("why".to_string()));

        let null = question_from_columns(Ok(None), text_never_read).unwrap();
        assert_eq!(null.normalize(), "");
    }

    #[test]
    fn test_text_question_column_fallback() {
        let question =
            question_from_columns(Err(mismatch()), || Ok(Some("{not json".to_string()))).unwrap();
        assert_eq!(question, UserQuestion::Text("{not json".to_string()));

        let null = question_from_columns(Err(mismatch()), || Ok(None)).unwrap();
        assert_eq!(null, UserQuestion::default());

        let err = question_from_columns(Err(mismatch()), || Err(mismatch())).unwrap_err();
        assert!(matches!(err, RepositoryError::Decode(_)));
    }

    #[test]
    fn test_project_id_width_fallback() {
        assert_eq!(project_id_from_columns(Ok(9_000_000_000), || Ok(1)).unwrap(), 9_000_000_000);
        assert_eq!(project_id_from_columns(Err(mismatch()), || Ok(42)).unwrap(), 42);
        assert!(matches!(
            project_id_from_columns(Err(mismatch()), || Err(mismatch())),
            Err(RepositoryError::Decode(_))
        ));
    }
}
