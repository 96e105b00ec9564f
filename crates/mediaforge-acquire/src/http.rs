//! Direct-URL download client backed by reqwest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use mediaforge_core::config::acquire::AcquireConfig;
use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;
use mediaforge_core::traits::ProgressFn;
use mediaforge_core::traits::download::{DownloadClient, RemoteInfo};

use crate::progress::ProgressThrottle;

/// Download client for plain HTTP(S) URLs.
///
/// Format selection is a no-op here: direct URLs have exactly one
/// representation. Providers with format catalogs plug in their own
/// [`DownloadClient`] implementation.
#[derive(Debug)]
pub struct HttpDownloadClient {
    client: reqwest::Client,
    progress_interval: Duration,
}

impl HttpDownloadClient {
    /// Build a client from acquisition configuration.
    pub fn new(config: &AcquireConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
        })
    }
}

/// Map an HTTP error status to the pipeline error taxonomy. 401/403 mean the
/// provider rejected our credentials or challenged us as a bot; that is an
/// authentication failure, not a transient network one.
fn classify_status(url: &str, status: StatusCode) -> AppError {
    let provider = provider_name(url);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::authentication(&provider, format!("request rejected with {status}"))
        }
        _ => AppError::network(format!("{provider} responded with {status}")),
    }
}

/// Host portion of the URL, used as the provider name in error messages.
fn provider_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown-provider".to_string())
}

#[async_trait]
impl DownloadClient for HttpDownloadClient {
    async fn resolve_info(&self, url: &str) -> AppResult<RemoteInfo> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| AppError::network(format!("HEAD {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(classify_status(url, response.status()));
        }

        let title = url
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("download")
            .to_string();

        Ok(RemoteInfo {
            title,
            duration_secs: None,
            formats: Vec::new(),
        })
    }

    async fn download(
        &self,
        url: &str,
        _format_id: Option<&str>,
        dest: &Path,
        progress: &ProgressFn,
    ) -> AppResult<PathBuf> {
        debug!(url, dest = %dest.display(), "Starting HTTP download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::network(format!("GET {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(classify_status(url, response.status()));
        }

        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create {}: {e}", dest.display())))?;

        let throttle = ProgressThrottle::new(self.progress_interval);
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| AppError::network(format!("stream from {url} broke: {e}")))?;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::storage(format!("Failed to write {}: {e}", dest.display()))
            })?;
            received += chunk.len() as u64;
            if throttle.ready() {
                progress(received, total);
            }
        }

        file.flush()
            .await
            .map_err(|e| AppError::storage(format!("Failed to flush {}: {e}", dest.display())))?;

        // Final report is never throttled away.
        progress(received, total);

        info!(url, bytes = received, dest = %dest.display(), "HTTP download complete");
        Ok(dest.to_path_buf())
    }
}
