//! Status sink collaborator interface.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline phase, reported to the status sink before each phase starts and
/// recorded on the task when a phase fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Source acquisition (URL download or transport fetch).
    Download,
    /// Probe, plan, and engine execution.
    Processing,
    /// Optional copy to the secondary storage location.
    Staging,
    /// Egress handoff.
    Delivery,
}

impl Phase {
    /// Return the phase as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Processing => "processing",
            Self::Staging => "staging",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort progress/status reporting.
///
/// Sinks never propagate failures: a report that cannot be delivered is
/// logged and dropped. Correctness of the pipeline must not depend on any
/// report arriving.
#[async_trait]
pub trait StatusSink: Send + Sync + std::fmt::Debug {
    /// Report that a task entered a phase, with human-readable detail.
    async fn report(&self, task_id: Uuid, phase: Phase, text: &str);

    /// Emit a non-fatal warning for a task (e.g. staging failed).
    async fn warn(&self, task_id: Uuid, text: &str);
}
