//! Task repository implementation.
//!
//! The claim operation is the correctness-critical piece: `FOR UPDATE SKIP
//! LOCKED` inside the id-selecting subquery guarantees at most one worker
//! transitions any given task from `pending` to `processing`, with no
//! in-process coordination.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use mediaforge_core::error::{AppError, ErrorKind};
use mediaforge_core::result::AppResult;
use mediaforge_entity::task::model::{NewTask, Task, TaskErrorInfo};
use mediaforge_entity::task::status::TaskStatus;

/// Repository for task CRUD and queue operations.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Create a new task repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit a new task into the queue.
    pub async fn submit(&self, data: &NewTask) -> AppResult<Task> {
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, owner_id, kind, source, config) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(data.kind)
        .bind(Json(&data.source))
        .bind(Json(&data.config))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to submit task", e))
    }

    /// Find a task by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find task", e))
    }

    /// Atomically claim the next pending task (SKIP LOCKED for concurrency).
    pub async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Task>> {
        sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = 'processing', started_at = NOW(), worker_id = $1 \
             WHERE id = ( \
                SELECT id FROM tasks \
                WHERE status = 'pending' \
                ORDER BY created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim task", e))
    }

    /// Mark a task as done.
    pub async fn mark_done(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE tasks SET status = 'done', completed_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark task done", e))?;
        Ok(())
    }

    /// Mark a task as failed with its error record.
    pub async fn mark_error(&self, id: Uuid, error: &TaskErrorInfo) -> AppResult<()> {
        sqlx::query(
            "UPDATE tasks SET status = 'error', error_phase = $2, error_message = $3, \
             error_log = $4, completed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&error.phase)
        .bind(&error.message)
        .bind(&error.log_excerpt)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark task as failed", e)
        })?;
        Ok(())
    }

    /// Mark a task as cancelled.
    pub async fn mark_cancelled(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE tasks SET status = 'cancelled', completed_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark task cancelled", e)
            })?;
        Ok(())
    }

    /// Flag a task for cancellation. Observed by the worker at the next
    /// phase boundary; has no effect on terminal tasks.
    pub async fn request_cancel(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET cancel_requested = TRUE \
             WHERE id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to request cancel", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Read the cancel flag for a task.
    pub async fn cancel_requested(&self, id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT cancel_requested FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read cancel flag", e))
            .map(|flag| flag.unwrap_or(false))
    }

    /// Set one key of a task's processing config.
    pub async fn update_config_key(
        &self,
        id: Uuid,
        key: &str,
        value: &serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query("UPDATE tasks SET config = jsonb_set(config, $2, $3, true) WHERE id = $1")
            .bind(id)
            .bind(vec![key.to_string()])
            .bind(Json(value))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update task config", e)
            })?;
        Ok(())
    }

    /// Return tasks stuck in `processing` since before `cutoff` to `pending`.
    ///
    /// Used by the maintenance sweep to recover tasks whose worker died
    /// mid-attempt. Returns the number of requeued tasks.
    pub async fn requeue_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'pending', worker_id = NULL, started_at = NULL \
             WHERE status = 'processing' AND started_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to requeue stale tasks", e))?;
        Ok(result.rows_affected())
    }

    /// Count tasks in a given status.
    pub async fn count_by_status(&self, status: TaskStatus) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count tasks", e))
    }

    /// Most recently submitted tasks, newest first.
    pub async fn find_recent(&self, limit: i64) -> AppResult<Vec<Task>> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tasks", e))
    }
}
