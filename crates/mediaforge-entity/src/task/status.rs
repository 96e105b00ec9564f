//! Task status and kind enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

use mediaforge_core::traits::transport::ArtifactKind;

/// Status of a queued task.
///
/// `pending → processing → {done, error, cancelled}`. No state is revisited;
/// a task ending in `error` is only retried via external re-submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be claimed by a worker.
    Pending,
    /// Exclusively owned by one worker attempt.
    Processing,
    /// Successfully completed.
    Done,
    /// Failed; see the error record for phase and message.
    Error,
    /// Cancelled before or between phases.
    Cancelled,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of media work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Video transcode/transform.
    Video,
    /// Audio transcode/transform.
    Audio,
    /// Opaque document handling.
    Document,
    /// Animated-image production.
    Gif,
    /// Concatenate multiple sources into one output.
    Join,
    /// Extract an archive into its member files.
    Archive,
}

impl TaskKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Gif => "gif",
            Self::Join => "join",
            Self::Archive => "archive",
        }
    }

    /// How the finished artifact should be presented at egress.
    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Self::Video | Self::Join => ArtifactKind::Video,
            Self::Audio => ArtifactKind::Audio,
            Self::Gif => ArtifactKind::Animation,
            Self::Document | Self::Archive => ArtifactKind::Document,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
    }

    #[test]
    fn test_artifact_kind_mapping() {
        assert_eq!(TaskKind::Gif.artifact_kind(), ArtifactKind::Animation);
        assert_eq!(TaskKind::Archive.artifact_kind(), ArtifactKind::Document);
        assert_eq!(TaskKind::Join.artifact_kind(), ArtifactKind::Video);
    }
}
