//! Filesystem-backed transport.
//!
//! Stands in for a chat-platform transport: inbound file references resolve
//! against a spool directory, finished artifacts land in a per-chat outbox
//! with a JSON sidecar describing kind and caption. Deployments with a real
//! messaging platform plug their own [`TransportClient`] in instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;
use mediaforge_core::traits::ProgressFn;
use mediaforge_core::traits::transport::{DeliveryRequest, FileReference, TransportClient};

/// Spool/outbox directory transport.
#[derive(Debug, Clone)]
pub struct SpoolTransport {
    spool_root: PathBuf,
    outbox_root: PathBuf,
}

impl SpoolTransport {
    /// Create a transport over the configured spool and outbox roots.
    pub fn new(spool_root: impl Into<PathBuf>, outbox_root: impl Into<PathBuf>) -> Self {
        Self {
            spool_root: spool_root.into(),
            outbox_root: outbox_root.into(),
        }
    }
}

#[async_trait]
impl TransportClient for SpoolTransport {
    async fn fetch(
        &self,
        file: &FileReference,
        dest: &Path,
        progress: &ProgressFn,
    ) -> AppResult<PathBuf> {
        let source = self.spool_root.join(&file.file_id);
        debug!(file_id = %file.file_id, source = %source.display(), "Fetching spool file");

        if !source.is_file() {
            return Err(AppError::not_found(format!(
                "No spool file for reference '{}'",
                file.file_id
            )));
        }

        let bytes = tokio::fs::copy(&source, dest).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to copy spool file to {}: {e}",
                dest.display()
            ))
        })?;

        progress(bytes, Some(bytes));
        Ok(dest.to_path_buf())
    }

    async fn deliver(&self, request: &DeliveryRequest, progress: &ProgressFn) -> AppResult<()> {
        let chat_dir = self.outbox_root.join(request.chat_id.to_string());
        tokio::fs::create_dir_all(&chat_dir).await.map_err(|e| {
            AppError::delivery(format!(
                "Failed to create outbox {}: {e}",
                chat_dir.display()
            ))
        })?;

        let dest = chat_dir.join(&request.display_name);
        let bytes = tokio::fs::copy(&request.path, &dest).await.map_err(|e| {
            AppError::delivery(format!(
                "Failed to deliver {} to {}: {e}",
                request.path.display(),
                dest.display()
            ))
        })?;

        let sidecar = json!({
            "display_name": request.display_name,
            "kind": request.kind.as_str(),
            "caption": request.caption,
            "with_thumbnail": request.with_thumbnail,
        });
        let sidecar_path = dest.with_extension(format!(
            "{}.json",
            dest.extension().and_then(|e| e.to_str()).unwrap_or("bin")
        ));
        tokio::fs::write(&sidecar_path, sidecar.to_string())
            .await
            .map_err(|e| AppError::delivery(format!("Failed to write delivery sidecar: {e}")))?;

        progress(bytes, Some(bytes));
        info!(
            chat_id = request.chat_id,
            dest = %dest.display(),
            bytes,
            "Delivered artifact"
        );
        Ok(())
    }
}
