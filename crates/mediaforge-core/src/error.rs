//! Unified application error types for Mediaforge.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A transient network failure occurred.
    Network,
    /// Credentials for an external provider are invalid or expired.
    Authentication,
    /// The working volume is out of headroom.
    DiskSpace,
    /// The acquired source is corrupt, absent, or unsupported.
    InvalidMedia,
    /// The external transformation engine failed.
    Engine,
    /// A storage I/O error occurred.
    Storage,
    /// Handing an artifact to the egress transport failed.
    Delivery,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// The task was cancelled by an external actor.
    Cancelled,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Network => write!(f, "NETWORK"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::DiskSpace => write!(f, "DISK_SPACE"),
            Self::InvalidMedia => write!(f, "INVALID_MEDIA"),
            Self::Engine => write!(f, "ENGINE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Delivery => write!(f, "DELIVERY"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Mediaforge.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Create an authentication error naming the provider the credentials
    /// belong to, so operators can tell "retry won't help" from transient
    /// network failure.
    pub fn authentication(provider: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Authentication,
            format!("{provider}: {}", message.into()),
        )
    }

    /// Create a disk-space error.
    pub fn disk_space(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DiskSpace, message)
    }

    /// Create an invalid-media error.
    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidMedia, message)
    }

    /// Create an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Engine, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Delivery, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a cancelled error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether a fresh submission of the same task could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::DiskSpace)
    }
}
