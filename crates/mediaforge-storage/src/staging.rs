//! Staging service: best-effort copy of finished artifacts.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use mediaforge_core::result::AppResult;

use crate::provider::StorageProvider;

/// Copies finished artifacts to the configured secondary destination.
#[derive(Debug, Clone)]
pub struct StagingService {
    provider: Arc<dyn StorageProvider>,
    enabled: bool,
}

impl StagingService {
    /// Create a staging service over a provider.
    pub fn new(provider: Arc<dyn StorageProvider>, enabled: bool) -> Self {
        Self { provider, enabled }
    }

    /// Whether staging is configured on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Copy `artifact` to the staging destination under `name`.
    pub async fn stage(&self, artifact: &Path, name: &str) -> AppResult<u64> {
        let bytes = self.provider.store(artifact, name).await?;
        info!(
            artifact = %artifact.display(),
            name,
            bytes,
            "Staged artifact to secondary destination"
        );
        Ok(bytes)
    }
}
