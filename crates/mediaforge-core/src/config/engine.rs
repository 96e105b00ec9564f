//! External transformation engine configuration.

use serde::{Deserialize, Serialize};

/// ffmpeg/ffprobe invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ffmpeg executable.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    /// Path to the ffprobe executable.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    /// Timeout in seconds for a single planned step.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,
    /// Maximum number of trailing log characters retained on step failure.
    #[serde(default = "default_log_tail")]
    pub log_tail_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            step_timeout_seconds: default_step_timeout(),
            log_tail_chars: default_log_tail(),
        }
    }
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_step_timeout() -> u64 {
    1800
}

fn default_log_tail() -> usize {
    2000
}
