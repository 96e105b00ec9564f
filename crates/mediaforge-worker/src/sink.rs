//! Status sink implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use mediaforge_core::traits::status::{Phase, StatusSink};

/// Sink that writes phase reports to the process log.
#[derive(Debug, Default)]
pub struct TracingStatusSink;

#[async_trait]
impl StatusSink for TracingStatusSink {
    async fn report(&self, task_id: Uuid, phase: Phase, text: &str) {
        info!(task_id = %task_id, phase = %phase, "{text}");
    }

    async fn warn(&self, task_id: Uuid, text: &str) {
        warn!(task_id = %task_id, "{text}");
    }
}

/// Decorator bounding per-task report rate.
///
/// Phase reports for one task are spaced at least `min_interval` apart so a
/// chatty progress source cannot overwhelm the sink behind it. Warnings
/// always pass through.
#[derive(Debug)]
pub struct ThrottledStatusSink {
    inner: Arc<dyn StatusSink>,
    min_interval: Duration,
    last: Mutex<HashMap<Uuid, Instant>>,
}

impl ThrottledStatusSink {
    /// Wrap `inner` with a per-task minimum report spacing.
    pub fn new(inner: Arc<dyn StatusSink>, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last: Mutex::new(HashMap::new()),
        }
    }

    fn ready(&self, task_id: Uuid) -> bool {
        let mut last = self.last.lock().expect("sink lock poisoned");
        let now = Instant::now();

        // Entries for finished tasks stop being touched; prune them once the
        // map grows past a handful of in-flight tasks.
        if last.len() > 256 {
            let horizon = self.min_interval * 10;
            last.retain(|_, at| now.duration_since(*at) < horizon);
        }

        match last.get(&task_id) {
            Some(previous) if now.duration_since(*previous) < self.min_interval => false,
            _ => {
                last.insert(task_id, now);
                true
            }
        }
    }
}

#[async_trait]
impl StatusSink for ThrottledStatusSink {
    async fn report(&self, task_id: Uuid, phase: Phase, text: &str) {
        if self.ready(task_id) {
            self.inner.report(task_id, phase, text).await;
        }
    }

    async fn warn(&self, task_id: Uuid, text: &str) {
        self.inner.warn(task_id, text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSink {
        reports: AtomicUsize,
        warnings: AtomicUsize,
    }

    #[async_trait]
    impl StatusSink for CountingSink {
        async fn report(&self, _task_id: Uuid, _phase: Phase, _text: &str) {
            self.reports.fetch_add(1, Ordering::SeqCst);
        }

        async fn warn(&self, _task_id: Uuid, _text: &str) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_reports_throttled_per_task() {
        let counter = Arc::new(CountingSink::default());
        let sink = ThrottledStatusSink::new(counter.clone(), Duration::from_secs(60));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        sink.report(a, Phase::Download, "one").await;
        sink.report(a, Phase::Download, "suppressed").await;
        sink.report(b, Phase::Download, "other task passes").await;

        assert_eq!(counter.reports.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warnings_bypass_throttle() {
        let counter = Arc::new(CountingSink::default());
        let sink = ThrottledStatusSink::new(counter.clone(), Duration::from_secs(60));
        let id = Uuid::new_v4();

        sink.warn(id, "w1").await;
        sink.warn(id, "w2").await;

        assert_eq!(counter.warnings.load(Ordering::SeqCst), 2);
    }
}
