//! Storage provider trait.

use std::path::Path;

use async_trait::async_trait;

use mediaforge_core::result::AppResult;

/// A destination finished artifacts can be copied into.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug {
    /// Store the file at `source` under `name`. Returns bytes written.
    async fn store(&self, source: &Path, name: &str) -> AppResult<u64>;

    /// Whether an object named `name` already exists.
    async fn exists(&self, name: &str) -> AppResult<bool>;

    /// Check that the destination is reachable and writable.
    async fn health_check(&self) -> AppResult<bool>;
}
