// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for pairwise evaluations. The store is consumed, not
//! owned: tasks and templates are written by other processes, this service
//! reads them and writes one provider response column back.
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|----------------|
//! | `EvaluationStore` | Opens one scoped session per evaluation | `InMemoryEvaluationStore`, `PostgresEvaluationStore` |
//! | `EvaluationSession` | Reads and the single write, inside one transaction | per store |
//!
//! ## Session lifecycle
//!
//! A session owns its connection and transaction. `commit` and `rollback`
//! consume it. Dropping a session without committing discards its writes and
//! releases the connection.

use async_trait::async_trait;
use crate::domain::evaluation::{EvaluationTask, PromptTemplate, ProjectId, TaskId};
use crate::domain::provider::Provider;

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Acquire a connection and open a transaction
    async fn begin(&self) -> Result<Box<dyn EvaluationSession>, RepositoryError>;
}

#[async_trait]
pub trait EvaluationSession: Send {
    /// Find the task row by id
    async fn find_task(&mut self, task_id: TaskId) -> Result<Option<EvaluationTask>, RepositoryError>;

    /// Find the active template for a project. When several are active the
    /// most recently created one is returned.
    async fn find_active_template(
        &mut self,
        project_id: ProjectId,
    ) -> Result<Option<PromptTemplate>, RepositoryError>;

    /// Write the provider's answer into its response column
    async fn save_response(
        &mut self,
        task_id: TaskId,
        provider: Provider,
        response: &str,
    ) -> Result<(), RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unexpected row shape: {0}")]
    Decode(String),

    #[error("Row not found: {0}")]
    NotFound(String),
}
