//! Local-directory storage provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use mediaforge_core::error::AppError;
use mediaforge_core::result::AppResult;

use crate::provider::StorageProvider;

/// Stores artifacts under a configured root directory.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        // Flatten any path separators out of the object name so a crafted
        // name cannot escape the root.
        let safe: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root.join(safe)
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    async fn store(&self, source: &Path, name: &str) -> AppResult<u64> {
        let dest = self.resolve(name);
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create staging root {}: {e}",
                self.root.display()
            ))
        })?;

        fs::copy(source, &dest).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to copy {} to {}: {e}",
                source.display(),
                dest.display()
            ))
        })
    }

    async fn exists(&self, name: &str) -> AppResult<bool> {
        Ok(fs::try_exists(self.resolve(name)).await.unwrap_or(false))
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::create_dir_all(&self.root).await {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_copies_bytes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("in.bin");
        tokio::fs::write(&source, b"artifact").await.expect("write");

        let provider = LocalStorageProvider::new(temp.path().join("staged"));
        let written = provider.store(&source, "out.bin").await.expect("store");

        assert_eq!(written, 8);
        assert!(provider.exists("out.bin").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_object_names_cannot_escape_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("in.bin");
        tokio::fs::write(&source, b"x").await.expect("write");

        let root = temp.path().join("staged");
        let provider = LocalStorageProvider::new(&root);
        provider
            .store(&source, "../escape.bin")
            .await
            .expect("store");

        assert!(!temp.path().join("escape.bin").exists());
        assert!(root.join(".._escape.bin").exists());
    }
}
