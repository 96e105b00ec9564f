//! Worker loop and resource guard configuration.

use serde::{Deserialize, Serialize};

/// Task worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker loop is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of CPU-intensive transformation permits. Acquisition and
    /// network I/O are not gated, only the execute phase.
    #[serde(default = "default_cpu_slots")]
    pub cpu_slots: usize,
    /// Interval in seconds between queue polls when no task is eligible.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Cooldown in seconds after an unexpected claim-cycle failure.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Root directory under which per-task workspaces are created.
    #[serde(default = "default_work_root")]
    pub work_root: String,
    /// Refuse disk-consuming phases once used capacity exceeds this percent.
    #[serde(default = "default_max_used_percent")]
    pub disk_max_used_percent: u8,
    /// Minimum free bytes required before a disk-consuming phase.
    #[serde(default = "default_min_free_bytes")]
    pub disk_min_free_bytes: u64,
    /// Requeue tasks stuck in `processing` for longer than this many minutes.
    #[serde(default = "default_stale_minutes")]
    pub stale_after_minutes: i64,
    /// Remove orphaned workspace directories older than this many minutes.
    #[serde(default = "default_sweep_minutes")]
    pub sweep_after_minutes: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            cpu_slots: default_cpu_slots(),
            poll_interval_seconds: default_poll_interval(),
            cooldown_seconds: default_cooldown(),
            work_root: default_work_root(),
            disk_max_used_percent: default_max_used_percent(),
            disk_min_free_bytes: default_min_free_bytes(),
            stale_after_minutes: default_stale_minutes(),
            sweep_after_minutes: default_sweep_minutes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cpu_slots() -> usize {
    2
}

fn default_poll_interval() -> u64 {
    3
}

fn default_cooldown() -> u64 {
    5
}

fn default_work_root() -> String {
    "data/work".to_string()
}

fn default_max_used_percent() -> u8 {
    90
}

fn default_min_free_bytes() -> u64 {
    // 1 GiB floor below which no transformation is attempted.
    1024 * 1024 * 1024
}

fn default_stale_minutes() -> i64 {
    120
}

fn default_sweep_minutes() -> u64 {
    180
}
