//! Staging storage configuration.

use serde::{Deserialize, Serialize};

/// Optional secondary destination for finished artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Whether finished artifacts are copied to the staging location.
    #[serde(default)]
    pub staging_enabled: bool,
    /// Root directory of the staging location.
    #[serde(default = "default_staging_root")]
    pub staging_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            staging_enabled: false,
            staging_root: default_staging_root(),
        }
    }
}

fn default_staging_root() -> String {
    "data/staging".to_string()
}
