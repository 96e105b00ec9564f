//! Queue store abstraction over the task table.
//!
//! The trait exists so the runner, processor, and scheduler can be exercised
//! against an in-memory double; the production implementation delegates to
//! the PostgreSQL repository, whose claim statement carries the atomicity
//! guarantee.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mediaforge_core::result::AppResult;
use mediaforge_database::repositories::task::TaskRepository;
use mediaforge_entity::task::model::{Task, TaskErrorInfo};

/// Claim/update operations the worker needs from the backing store.
#[async_trait]
pub trait QueueStore: Send + Sync + std::fmt::Debug {
    /// Atomically claim the next pending task for `worker_id`.
    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Task>>;

    /// Find a task by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>>;

    /// Transition a task to `done`.
    async fn mark_done(&self, id: Uuid) -> AppResult<()>;

    /// Transition a task to `error` with its failure record.
    async fn mark_error(&self, id: Uuid, error: &TaskErrorInfo) -> AppResult<()>;

    /// Transition a task to `cancelled`.
    async fn mark_cancelled(&self, id: Uuid) -> AppResult<()>;

    /// Read a task's cancel flag.
    async fn cancel_requested(&self, id: Uuid) -> AppResult<bool>;

    /// Return tasks stuck in `processing` since before `cutoff` to
    /// `pending`. Returns the number requeued.
    async fn requeue_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL-backed queue store.
#[derive(Debug, Clone)]
pub struct PgQueueStore {
    repo: Arc<TaskRepository>,
}

impl PgQueueStore {
    /// Wrap a task repository.
    pub fn new(repo: Arc<TaskRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl QueueStore for PgQueueStore {
    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Task>> {
        self.repo.claim_next(worker_id).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        self.repo.find_by_id(id).await
    }

    async fn mark_done(&self, id: Uuid) -> AppResult<()> {
        self.repo.mark_done(id).await
    }

    async fn mark_error(&self, id: Uuid, error: &TaskErrorInfo) -> AppResult<()> {
        self.repo.mark_error(id, error).await
    }

    async fn mark_cancelled(&self, id: Uuid) -> AppResult<()> {
        self.repo.mark_cancelled(id).await
    }

    async fn cancel_requested(&self, id: Uuid) -> AppResult<bool> {
        self.repo.cancel_requested(id).await
    }

    async fn requeue_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.repo.requeue_stale(cutoff).await
    }
}
