//! Unified error type for engine planning and execution.

use std::path::PathBuf;

use thiserror::Error;

use mediaforge_core::error::AppError;

/// Errors from command planning and step execution.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process exited with a non-zero code.
    #[error("Engine step '{label}' failed with exit code {code}")]
    ProcessFailed {
        /// Label of the failed step.
        label: String,
        /// The exit code (-1 for signal termination).
        code: i32,
        /// Bounded tail of the combined engine output.
        log: String,
    },

    /// The engine process exceeded the step timeout and was killed.
    #[error("Engine step '{label}' timed out after {timeout_seconds}s")]
    Timeout {
        /// Label of the timed-out step.
        label: String,
        /// The timeout that was exceeded.
        timeout_seconds: u64,
    },

    /// A step reported success but its declared output is absent or empty.
    #[error("Expected output not created: {path}")]
    OutputMissing {
        /// The declared output path.
        path: PathBuf,
    },

    /// No extraction tool is registered for this archive extension.
    #[error("Unsupported archive format: .{extension}")]
    UnsupportedArchive {
        /// The unrecognized extension.
        extension: String,
    },

    /// The task configuration cannot be turned into a valid plan.
    #[error("Cannot plan task: {reason}")]
    InvalidPlan {
        /// What made the configuration unplannable.
        reason: String,
    },

    /// IO error while spawning or supervising the engine process.
    #[error("IO error during engine execution: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Engine log excerpt attached to the error, when one exists.
    pub fn log_excerpt(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { log, .. } if !log.is_empty() => Some(log),
            _ => None,
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::UnsupportedArchive { .. } | EngineError::InvalidPlan { .. } => {
                AppError::invalid_media(err.to_string())
            }
            _ => AppError::engine(err.to_string()),
        }
    }
}
