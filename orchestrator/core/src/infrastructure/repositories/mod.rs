// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `EvaluationStore` abstraction
//! defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Read evaluation tasks and templates, write provider responses
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresEvaluationStore** - transactional store over the configured tables
//! - **InMemoryEvaluationStore** - Mutex-backed store for tests and local runs.
//!   Writes are staged per session and applied on commit, so it honours the
//!   same commit/rollback contract as the relational store.

pub mod postgres_evaluation;

pub use postgres_evaluation::PostgresEvaluationStore;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::evaluation::{EvaluationTask, PromptTemplate, ProjectId, TaskId};
use crate::domain::provider::Provider;
use crate::domain::repository::{EvaluationSession, EvaluationStore, RepositoryError};
use crate::domain::service_config::{EvaluatorConfigSpec, StoreBackendKind};
use crate::infrastructure::db::Database;

#[derive(Debug, Clone)]
struct StoredTemplate {
    project_id: ProjectId,
    content: String,
    active: bool,
    // Insertion order stands in for the creation timestamp
    sequence: u64,
}

#[derive(Default)]
struct InMemoryState {
    tasks: HashMap<TaskId, EvaluationTask>,
    responses: HashMap<(TaskId, Provider), String>,
    templates: Vec<StoredTemplate>,
    next_sequence: u64,
    sessions_opened: usize,
    commits: usize,
    rollbacks: usize,
    writes_issued: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryEvaluationStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryEvaluationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&self, task: EvaluationTask) {
        self.state.lock().tasks.insert(task.task_id, task);
    }

    /// Add a template. Later inserts count as more recently created.
    pub fn insert_template(&self, project_id: ProjectId, content: impl Into<String>, active: bool) {
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.templates.push(StoredTemplate {
            project_id,
            content: content.into(),
            active,
            sequence,
        });
    }

    /// Committed response for a task, if any
    pub fn response_for(&self, task_id: TaskId, provider: Provider) -> Option<String> {
        self.state.lock().responses.get(&(task_id, provider)).cloned()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().sessions_opened
    }

    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().rollbacks
    }

    /// Writes issued through sessions, committed or not
    pub fn writes_issued(&self) -> usize {
        self.state.lock().writes_issued
    }
}

#[async_trait]
impl EvaluationStore for InMemoryEvaluationStore {
    async fn begin(&self) -> Result<Box<dyn EvaluationSession>, RepositoryError> {
        self.state.lock().sessions_opened += 1;
        Ok(Box::new(InMemorySession {
            state: self.state.clone(),
            staged: Vec::new(),
        }))
    }
}

struct InMemorySession {
    state: Arc<Mutex<InMemoryState>>,
    staged: Vec<(TaskId, Provider, String)>,
}

#[async_trait]
impl EvaluationSession for InMemorySession {
    async fn find_task(&mut self, task_id: TaskId) -> Result<Option<EvaluationTask>, RepositoryError> {
        Ok(self.state.lock().tasks.get(&task_id).cloned())
    }

    async fn find_active_template(
        &mut self,
        project_id: ProjectId,
    ) -> Result<Option<PromptTemplate>, RepositoryError> {
        let state = self.state.lock();
        Ok(state
            .templates
            .iter()
            .filter(|t| t.project_id == project_id && t.active)
            .max_by_key(|t| t.sequence)
            .map(|t| PromptTemplate {
                project_id: t.project_id,
                content: t.content.clone(),
            }))
    }

    async fn save_response(
        &mut self,
        task_id: TaskId,
        provider: Provider,
        response: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock();
        state.writes_issued += 1;
        if !state.tasks.contains_key(&task_id) {
            return Err(RepositoryError::NotFound(format!("task {}", task_id)));
        }
        self.staged.push((task_id, provider, response.to_string()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let session = *self;
        let mut state = session.state.lock();
        for (task_id, provider, response) in session.staged {
            state.responses.insert((task_id, provider), response);
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.state.lock().rollbacks += 1;
        Ok(())
    }
}

/// Build the configured store. The PostgreSQL pool is lazy, so this never
/// touches the network.
pub fn create_evaluation_store(spec: &EvaluatorConfigSpec) -> anyhow::Result<Arc<dyn EvaluationStore>> {
    match spec.database.backend {
        StoreBackendKind::Postgres => {
            info!("Using PostgreSQL evaluation store");
            let db = Database::connect_lazy(&spec.database)?;
            Ok(Arc::new(PostgresEvaluationStore::new(
                db.get_pool().clone(),
                &spec.tables,
            )))
        }
        StoreBackendKind::InMemory => {
            info!("Using in-memory evaluation store");
            Ok(Arc::new(InMemoryEvaluationStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::UserQuestion;

    fn task(task_id: TaskId) -> EvaluationTask {
        EvaluationTask {
            task_id,
            left_response: "left".to_string(),
            right_response: "right".to_string(),
            user_question: UserQuestion::Text("q".to_string()),
            project_id: 1,
        }
    }

    #[tokio::test]
    async fn test_newest_active_template_wins() {
        let store = InMemoryEvaluationStore::new();
        store.insert_template(1, "old", true);
        store.insert_template(1, "inactive", false);
        store.insert_template(1, "new", true);
        store.insert_template(2, "other project", true);

        let mut session = store.begin().await.unwrap();
        let template = session.find_active_template(1).await.unwrap().unwrap();
        assert_eq!(template.content, "new");
        assert!(session.find_active_template(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_are_visible_only_after_commit() {
        let store = InMemoryEvaluationStore::new();
        store.insert_task(task(5));

        let mut session = store.begin().await.unwrap();
        session.save_response(5, Provider::Gemini, "verdict").await.unwrap();
        assert!(store.response_for(5, Provider::Gemini).is_none());
        session.commit().await.unwrap();

        assert_eq!(store.response_for(5, Provider::Gemini).as_deref(), Some("verdict"));
        assert!(store.response_for(5, Provider::OpenAI).is_none());
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let store = InMemoryEvaluationStore::new();
        store.insert_task(task(5));

        let mut session = store.begin().await.unwrap();
        session.save_response(5, Provider::OpenAI, "draft").await.unwrap();
        session.rollback().await.unwrap();

        assert!(store.response_for(5, Provider::OpenAI).is_none());
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.writes_issued(), 1);
    }

    #[tokio::test]
    async fn test_dropped_session_discards_staged_writes() {
        let store = InMemoryEvaluationStore::new();
        store.insert_task(task(5));
        {
            let mut session = store.begin().await.unwrap();
            session.save_response(5, Provider::OpenAI, "draft").await.unwrap();
        }
        assert!(store.response_for(5, Provider::OpenAI).is_none());
    }

    #[test]
    fn test_factory_selects_backend() {
        let mut spec = EvaluatorConfigSpec::default();
        spec.database.backend = StoreBackendKind::InMemory;
        assert!(create_evaluation_store(&spec).is_ok());
    }
}
