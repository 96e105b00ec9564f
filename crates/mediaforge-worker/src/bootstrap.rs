//! Component wiring shared by the daemon and the CLI.
//!
//! Everything is explicitly constructed and injected; there is no global
//! state. One guard, one processor, one runner per call.

use std::sync::Arc;
use std::time::Duration;

use mediaforge_acquire::{HttpDownloadClient, SourceAcquirer};
use mediaforge_core::config::AppConfig;
use mediaforge_core::result::AppResult;
use mediaforge_core::traits::status::StatusSink;
use mediaforge_database::repositories::task::TaskRepository;
use mediaforge_engine::{CommandPlanner, MediaProber, StepExecutor};
use mediaforge_storage::{LocalStorageProvider, StagingService};
use uuid::Uuid;

use crate::guard::ResourceGuard;
use crate::processor::TaskProcessor;
use crate::queue::{PgQueueStore, QueueStore};
use crate::runner::WorkerRunner;
use crate::scheduler::MaintenanceScheduler;
use crate::sink::{ThrottledStatusSink, TracingStatusSink};
use crate::spool::SpoolTransport;

/// A fully wired worker pipeline.
pub struct Pipeline {
    /// The claim-loop runner.
    pub runner: WorkerRunner,
    /// The maintenance scheduler.
    pub scheduler: MaintenanceScheduler,
    /// The queue store handle, for callers that need direct access.
    pub store: Arc<dyn QueueStore>,
}

/// Build the worker pipeline from configuration and a task repository.
pub async fn build(config: &AppConfig, repo: TaskRepository) -> AppResult<Pipeline> {
    let store: Arc<dyn QueueStore> = Arc::new(PgQueueStore::new(Arc::new(repo)));

    let transport = Arc::new(SpoolTransport::new(
        &config.delivery.spool_root,
        &config.delivery.outbox_root,
    ));

    let download = Arc::new(HttpDownloadClient::new(&config.acquire)?);
    let acquirer = SourceAcquirer::new(download, transport.clone());

    let sink: Arc<dyn StatusSink> = Arc::new(ThrottledStatusSink::new(
        Arc::new(TracingStatusSink),
        Duration::from_millis(config.acquire.progress_interval_ms),
    ));

    let staging = StagingService::new(
        Arc::new(LocalStorageProvider::new(&config.storage.staging_root)),
        config.storage.staging_enabled,
    );

    let guard = Arc::new(ResourceGuard::new(&config.worker));

    let processor = Arc::new(TaskProcessor::new(
        Arc::clone(&store),
        acquirer,
        MediaProber::new(&config.engine),
        CommandPlanner::new(&config.engine),
        StepExecutor::new(&config.engine),
        guard,
        staging,
        transport,
        sink,
        config.worker.clone(),
        config.delivery.clone(),
    ));

    let worker_id = worker_id();
    let runner = WorkerRunner::new(
        Arc::clone(&store),
        processor,
        config.worker.clone(),
        worker_id,
    );

    let scheduler = MaintenanceScheduler::new(Arc::clone(&store), config.worker.clone()).await?;
    scheduler.register_default_tasks().await?;

    Ok(Pipeline {
        runner,
        scheduler,
        store,
    })
}

/// Stable-enough worker identifier: hostname plus a short random suffix so
/// concurrent workers on one host stay distinguishable in the store.
fn worker_id() -> String {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string());
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{host}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_is_unique_per_call() {
        let a = worker_id();
        let b = worker_id();
        assert_ne!(a, b);
        assert!(a.contains('-'));
    }
}
