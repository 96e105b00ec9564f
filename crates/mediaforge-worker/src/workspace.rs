//! Per-attempt temporary workspace.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;

/// Exclusively-owned temporary directory for one task attempt.
///
/// Created at the start of processing and removed on every exit path;
/// the processor calls [`TaskWorkspace::remove`] unconditionally after the
/// pipeline result is known.
#[derive(Debug)]
pub struct TaskWorkspace {
    root: PathBuf,
}

impl TaskWorkspace {
    /// Create the workspace directory `<work_root>/<task-id>`.
    pub async fn create(work_root: &Path, task_id: Uuid) -> AppResult<Self> {
        let root = work_root.join(task_id.simple().to_string());
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create workspace {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path for an acquired or produced file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Subdirectory holding produced artifacts; created on demand.
    pub async fn output_dir(&self) -> AppResult<PathBuf> {
        let dir = self.root.join("out");
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::storage(format!("Failed to create {}: {e}", dir.display()))
        })?;
        Ok(dir)
    }

    /// Remove the workspace and everything in it. Best-effort: a failure is
    /// logged, never propagated, so cleanup cannot mask the pipeline result.
    pub async fn remove(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            if self.root.exists() {
                warn!(
                    workspace = %self.root.display(),
                    error = %e,
                    "Failed to remove workspace"
                );
            }
        }
    }
}
