//! Worker runner — the top-level claim loop.
//!
//! Each runner claims one task at a time and processes it fully before the
//! next claim. Correctness of "at most one worker per task" rests entirely
//! on the store's atomic claim, so several runners (in-process or separate
//! processes) can share one queue. A failed cycle logs, cools down, and the
//! loop continues; the runner only ever stops on the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, trace, warn};

use mediaforge_core::config::worker::WorkerConfig;

use crate::processor::TaskProcessor;
use crate::queue::QueueStore;

/// Outcome of one claim-process cycle.
enum Cycle {
    /// A task was claimed and processed; poll again immediately.
    Processed,
    /// No eligible task; idle for the poll interval.
    Idle,
    /// The cycle failed unexpectedly; cool down before retrying.
    Failed,
}

/// Claim-loop driver for one worker.
#[derive(Debug)]
pub struct WorkerRunner {
    store: Arc<dyn QueueStore>,
    processor: Arc<TaskProcessor>,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    /// Create a runner.
    pub fn new(
        store: Arc<dyn QueueStore>,
        processor: Arc<TaskProcessor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            store,
            processor,
            config,
            worker_id,
        }
    }

    /// Run until the shutdown signal flips. One task is fully processed per
    /// iteration; an in-flight task finishes before shutdown completes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            worker_id = %self.worker_id,
            poll_interval_s = self.config.poll_interval_seconds,
            "Worker started"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);
        let cooldown = Duration::from_secs(self.config.cooldown_seconds);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let cycle = tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                cycle = self.claim_and_process() => cycle,
            };

            let pause = match cycle {
                Cycle::Processed => continue,
                Cycle::Idle => poll_interval,
                Cycle::Failed => cooldown,
            };

            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep(pause) => {}
            }
        }

        info!(worker_id = %self.worker_id, "Worker shut down");
    }

    /// One claim-process cycle. The processor runs inside a spawned task so
    /// a panic in pipeline code surfaces as a join error here instead of
    /// tearing the loop down.
    async fn claim_and_process(&self) -> Cycle {
        let task = match self.store.claim_next(&self.worker_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                trace!(worker_id = %self.worker_id, "No eligible task");
                return Cycle::Idle;
            }
            Err(e) => {
                error!(worker_id = %self.worker_id, error = %e, "Claim failed");
                return Cycle::Failed;
            }
        };

        let task_id = task.id;
        let processor = Arc::clone(&self.processor);
        let handle = tokio::spawn(async move { processor.process(task).await });

        match handle.await {
            Ok(()) => Cycle::Processed,
            Err(e) => {
                // Unexpected fault (panic) in the pipeline: the task stays
                // in `processing` until the stale sweep requeues it.
                warn!(
                    worker_id = %self.worker_id,
                    task_id = %task_id,
                    error = %e,
                    "Task processing aborted unexpectedly"
                );
                Cycle::Failed
            }
        }
    }
}
