//! Source acquisition orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;
use mediaforge_core::traits::ProgressFn;
use mediaforge_core::traits::download::DownloadClient;
use mediaforge_core::traits::transport::TransportClient;
use mediaforge_entity::task::source::TaskSource;

/// Resolves a task source to a local file.
///
/// URL sources go through the download client; transport file references go
/// through the transport collaborator, which routes small and large payloads
/// internally — this side only asserts that a local file results.
#[derive(Debug, Clone)]
pub struct SourceAcquirer {
    download: Arc<dyn DownloadClient>,
    transport: Arc<dyn TransportClient>,
}

impl SourceAcquirer {
    /// Create an acquirer over the two byte-moving collaborators.
    pub fn new(download: Arc<dyn DownloadClient>, transport: Arc<dyn TransportClient>) -> Self {
        Self {
            download,
            transport,
        }
    }

    /// Acquire `source` into `dest`.
    ///
    /// Idempotent: an existing non-empty file at `dest` short-circuits
    /// without a second network or transport call and returns the same
    /// path. A reported success that leaves no bytes behind is an
    /// invalid-media failure, not a silent empty artifact.
    pub async fn acquire(
        &self,
        source: &TaskSource,
        dest: &Path,
        progress: &ProgressFn,
    ) -> AppResult<PathBuf> {
        if file_has_bytes(dest) {
            debug!(dest = %dest.display(), "Destination already acquired, skipping");
            return Ok(dest.to_path_buf());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let path = match source {
            TaskSource::Url { url, format_id } => {
                self.download
                    .download(url, format_id.as_deref(), dest, progress)
                    .await?
            }
            TaskSource::TransportFile(file) => {
                self.transport.fetch(file, dest, progress).await?
            }
        };

        if !file_has_bytes(&path) {
            return Err(AppError::invalid_media(format!(
                "Acquired source is absent or empty: {}",
                path.display()
            )));
        }

        info!(dest = %path.display(), "Source acquired");
        Ok(path)
    }
}

/// Whether a regular file exists at `path` with at least one byte.
fn file_has_bytes(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use mediaforge_core::traits::download::RemoteInfo;
    use mediaforge_core::traits::transport::{DeliveryRequest, FileReference};

    /// Download client double that counts calls and writes fixed content.
    #[derive(Debug, Default)]
    struct CountingDownloads {
        calls: AtomicUsize,
        content: &'static str,
    }

    #[async_trait]
    impl DownloadClient for CountingDownloads {
        async fn resolve_info(&self, _url: &str) -> AppResult<RemoteInfo> {
            Ok(RemoteInfo {
                title: "t".to_string(),
                duration_secs: None,
                formats: Vec::new(),
            })
        }

        async fn download(
            &self,
            _url: &str,
            _format_id: Option<&str>,
            dest: &Path,
            progress: &ProgressFn,
        ) -> AppResult<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(dest, self.content).await.unwrap();
            progress(self.content.len() as u64, Some(self.content.len() as u64));
            Ok(dest.to_path_buf())
        }
    }

    /// Transport double that always fails authentication.
    #[derive(Debug)]
    struct NoTransport;

    #[async_trait]
    impl TransportClient for NoTransport {
        async fn fetch(
            &self,
            _file: &FileReference,
            _dest: &Path,
            _progress: &ProgressFn,
        ) -> AppResult<PathBuf> {
            Err(AppError::authentication("provider-x", "session expired"))
        }

        async fn deliver(
            &self,
            _request: &DeliveryRequest,
            _progress: &ProgressFn,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    fn url_source() -> TaskSource {
        TaskSource::Url {
            url: "https://example.com/a.mp4".to_string(),
            format_id: None,
        }
    }

    #[tokio::test]
    async fn test_acquire_downloads_once_then_short_circuits() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dest = temp.path().join("a.mp4");
        let downloads = Arc::new(CountingDownloads {
            calls: AtomicUsize::new(0),
            content: "bytes",
        });
        let acquirer = SourceAcquirer::new(downloads.clone(), Arc::new(NoTransport));

        let first = acquirer
            .acquire(&url_source(), &dest, &|_, _| {})
            .await
            .expect("first acquire");
        let second = acquirer
            .acquire(&url_source(), &dest, &|_, _| {})
            .await
            .expect("second acquire");

        assert_eq!(first, second);
        assert_eq!(downloads.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_artifact_is_invalid_media() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dest = temp.path().join("empty.mp4");
        let downloads = Arc::new(CountingDownloads {
            calls: AtomicUsize::new(0),
            content: "",
        });
        let acquirer = SourceAcquirer::new(downloads, Arc::new(NoTransport));

        let err = acquirer
            .acquire(&url_source(), &dest, &|_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind, mediaforge_core::error::ErrorKind::InvalidMedia);
    }

    #[tokio::test]
    async fn test_transport_authentication_error_propagates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dest = temp.path().join("f.bin");
        let downloads = Arc::new(CountingDownloads {
            calls: AtomicUsize::new(0),
            content: "x",
        });
        let acquirer = SourceAcquirer::new(downloads, Arc::new(NoTransport));

        let source = TaskSource::TransportFile(FileReference {
            channel_id: 1,
            message_id: 2,
            file_id: "f".to_string(),
            file_name: None,
            size_bytes: None,
        });

        let err = acquirer
            .acquire(&source, &dest, &|_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind, mediaforge_core::error::ErrorKind::Authentication);
        assert!(err.message.contains("provider-x"));
    }
}
