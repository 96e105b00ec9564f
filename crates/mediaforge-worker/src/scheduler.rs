//! Cron scheduler for periodic maintenance.
//!
//! Two jobs keep a long-running deployment healthy: requeueing tasks whose
//! worker died mid-attempt, and sweeping workspace directories orphaned by
//! hard crashes. Both are log-only on failure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, info, warn};

use mediaforge_core::config::worker::WorkerConfig;
use mediaforge_core::error::AppError;

use crate::queue::QueueStore;

/// Cron-based scheduler for periodic maintenance tasks.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
    store: Arc<dyn QueueStore>,
    config: WorkerConfig,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Create a scheduler over the queue store.
    pub async fn new(store: Arc<dyn QueueStore>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            store,
            config,
        })
    }

    /// Register all maintenance tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_stale_requeue().await?;
        self.register_workspace_sweep().await?;
        info!("All maintenance tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Maintenance scheduler shut down");
        Ok(())
    }

    /// Stale-task requeue — every 10 minutes.
    async fn register_stale_requeue(&self) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        let stale_minutes = self.config.stale_after_minutes;

        let job = CronJob::new_async("0 */10 * * * *", move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                let cutoff = Utc::now() - chrono::Duration::minutes(stale_minutes);
                match store.requeue_stale(cutoff).await {
                    Ok(0) => debug!("No stale tasks to requeue"),
                    Ok(count) => info!(count, "Requeued stale tasks"),
                    Err(e) => warn!(error = %e, "Stale-task requeue failed"),
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create stale-requeue schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add stale-requeue job: {e}")))?;
        Ok(())
    }

    /// Orphaned-workspace sweep — every 30 minutes.
    async fn register_workspace_sweep(&self) -> Result<(), AppError> {
        let work_root = PathBuf::from(&self.config.work_root);
        let max_age = Duration::from_secs(self.config.sweep_after_minutes * 60);

        let job = CronJob::new_async("0 */30 * * * *", move |_uuid, _lock| {
            let work_root = work_root.clone();
            Box::pin(async move {
                let removed = sweep_workspaces(&work_root, max_age).await;
                if removed > 0 {
                    info!(removed, root = %work_root.display(), "Swept orphaned workspaces");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep job: {e}")))?;
        Ok(())
    }
}

/// Remove workspace directories not modified for `max_age`. Returns the
/// number removed; every failure is logged and skipped.
pub async fn sweep_workspaces(work_root: &std::path::Path, max_age: Duration) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(work_root).await else {
        return 0;
    };

    let now = SystemTime::now();
    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let age = entry
            .metadata()
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok());

        match age {
            Some(age) if age > max_age => {
                if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                    warn!(workspace = %path.display(), error = %e, "Failed to sweep workspace");
                } else {
                    removed += 1;
                }
            }
            _ => {}
        }
    }
    removed
}
