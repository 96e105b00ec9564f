//! Task entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::processing::ProcessingConfig;

use super::source::TaskSource;
use super::status::{TaskKind, TaskStatus};

/// One queued unit of media-processing work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique task identifier.
    pub id: Uuid,
    /// Submitting-user identifier (opaque to the pipeline).
    pub owner_id: i64,
    /// Kind of media work.
    pub kind: TaskKind,
    /// Where the source bytes come from.
    pub source: Json<TaskSource>,
    /// Declarative processing options.
    pub config: Json<ProcessingConfig>,
    /// Current status.
    pub status: TaskStatus,
    /// Set by external actors; observed at phase boundaries only.
    pub cancel_requested: bool,
    /// Phase the task failed in, when status is `error`.
    pub error_phase: Option<String>,
    /// Human-readable failure summary.
    pub error_message: Option<String>,
    /// Bounded engine log excerpt retained for diagnostics.
    pub error_log: Option<String>,
    /// Worker that claimed the task.
    pub worker_id: Option<String>,
    /// When the task was submitted.
    pub created_at: DateTime<Utc>,
    /// When a worker claimed the task.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Display name for the finished artifact: the rename override when set,
    /// otherwise derived from the source.
    pub fn display_name(&self) -> String {
        self.config
            .rename
            .clone()
            .unwrap_or_else(|| self.source.display_name())
    }
}

/// Data required to submit a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    /// Submitting-user identifier.
    pub owner_id: i64,
    /// Kind of media work.
    pub kind: TaskKind,
    /// Where the source bytes come from.
    pub source: TaskSource,
    /// Declarative processing options.
    pub config: ProcessingConfig,
}

/// Terminal failure record persisted on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskErrorInfo {
    /// Phase label the failure occurred in.
    pub phase: String,
    /// Human-readable summary (never a raw backtrace).
    pub message: String,
    /// Bounded engine log excerpt, when the engine produced one.
    pub log_excerpt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(config: ProcessingConfig) -> Task {
        Task {
            id: Uuid::new_v4(),
            owner_id: 42,
            kind: TaskKind::Video,
            source: Json(TaskSource::Url {
                url: "https://example.com/movie.mkv".to_string(),
                format_id: None,
            }),
            config: Json(config),
            status: TaskStatus::Pending,
            cancel_requested: false,
            error_phase: None,
            error_message: None,
            error_log: None,
            worker_id: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_display_name_prefers_rename() {
        let mut config = ProcessingConfig::default();
        config.rename = Some("My Movie.mkv".to_string());
        assert_eq!(sample_task(config).display_name(), "My Movie.mkv");
    }

    #[test]
    fn test_display_name_falls_back_to_source() {
        assert_eq!(
            sample_task(ProcessingConfig::default()).display_name(),
            "movie.mkv"
        );
    }
}
