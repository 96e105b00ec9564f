//! Remote URL download client collaborator interface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::traits::ProgressFn;

/// A format/quality variant offered by a remote provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFormat {
    /// Opaque provider-scoped format identifier.
    pub id: String,
    /// Human-readable note ("720p", "audio only", ...).
    pub note: Option<String>,
}

/// Resolved metadata for a remote URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteInfo {
    /// Title of the remote media.
    pub title: String,
    /// Duration in seconds, if the provider reports it.
    pub duration_secs: Option<f64>,
    /// Available download formats.
    pub formats: Vec<RemoteFormat>,
}

/// Swappable client for fetching remote URLs.
///
/// Authentication failures (expired cookies, anti-bot challenges) must
/// surface as `ErrorKind::Authentication` naming the provider, distinct from
/// transient `ErrorKind::Network` failures.
#[async_trait]
pub trait DownloadClient: Send + Sync + std::fmt::Debug {
    /// Resolve title/duration/format metadata for a URL without downloading.
    async fn resolve_info(&self, url: &str) -> AppResult<RemoteInfo>;

    /// Download `url` to `dest`, optionally selecting a provider format.
    async fn download(
        &self,
        url: &str,
        format_id: Option<&str>,
        dest: &Path,
        progress: &ProgressFn,
    ) -> AppResult<PathBuf>;
}
