//! Resource guard: CPU permit pool and disk headroom checks.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use mediaforge_core::config::worker::WorkerConfig;
use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;

/// Bounds concurrent CPU-intensive transformation work and refuses
/// disk-consuming phases when the working volume is low on headroom.
///
/// Only the execute phase holds a permit; acquisition and network I/O are
/// deliberately ungated so I/O-bound and CPU-bound work overlap across
/// concurrently processed tasks.
#[derive(Debug)]
pub struct ResourceGuard {
    permits: Arc<Semaphore>,
    max_used_percent: u8,
    min_free_bytes: u64,
}

impl ResourceGuard {
    /// Create a guard from worker configuration.
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.cpu_slots)),
            max_used_percent: config.disk_max_used_percent,
            min_free_bytes: config.disk_min_free_bytes,
        }
    }

    /// Block until a CPU permit is available.
    ///
    /// The returned permit releases on drop, so release is exactly-once on
    /// every path including errors. There is deliberately no timeout;
    /// callers bound their wait by composing with their own cancellation.
    pub async fn acquire_slot(&self) -> AppResult<OwnedSemaphorePermit> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AppError::internal("CPU permit semaphore closed"))
    }

    /// Currently available CPU permits.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Check free capacity of the volume holding `path`.
    ///
    /// Read-only and advisory: state can change between the check and the
    /// consumption, so callers re-check before each disk-consuming phase.
    /// The check-to-use race is accepted, not papered over.
    pub fn check_disk_space(&self, path: &Path, required_bytes: u64) -> AppResult<()> {
        let total = fs4::total_space(path)
            .map_err(|e| AppError::storage(format!("Failed to stat volume: {e}")))?;
        let available = fs4::available_space(path)
            .map_err(|e| AppError::storage(format!("Failed to stat volume: {e}")))?;

        debug!(
            path = %path.display(),
            total,
            available,
            required_bytes,
            "Disk headroom check"
        );

        evaluate_headroom(
            total,
            available,
            required_bytes,
            self.max_used_percent,
            self.min_free_bytes,
        )
    }
}

/// Pure headroom policy: fail when used capacity exceeds the threshold
/// percentage, or when fewer bytes are free than the caller needs (with the
/// configured floor).
fn evaluate_headroom(
    total: u64,
    available: u64,
    required_bytes: u64,
    max_used_percent: u8,
    min_free_bytes: u64,
) -> AppResult<()> {
    if total == 0 {
        return Err(AppError::storage("Volume reports zero capacity"));
    }

    let used = total.saturating_sub(available);
    let used_percent = used * 100 / total;

    if used_percent > u64::from(max_used_percent) {
        return Err(AppError::disk_space(format!(
            "Working volume is {used_percent}% full (threshold {max_used_percent}%)"
        )));
    }

    let needed = required_bytes.max(min_free_bytes);
    if available < needed {
        return Err(AppError::disk_space(format!(
            "Only {available} bytes free, {needed} required"
        )));
    }

    Ok(())
}
