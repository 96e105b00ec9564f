//! Source acquisition configuration.

use serde::{Deserialize, Serialize};

/// Download client and progress reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Overall HTTP request timeout in seconds for URL downloads.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// User-Agent header sent by the download client.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum milliseconds between two progress reports for one transfer.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: default_http_timeout(),
            user_agent: default_user_agent(),
            progress_interval_ms: default_progress_interval(),
        }
    }
}

fn default_http_timeout() -> u64 {
    3600
}

fn default_user_agent() -> String {
    format!("mediaforge/{}", env!("CARGO_PKG_VERSION"))
}

fn default_progress_interval() -> u64 {
    1500
}
