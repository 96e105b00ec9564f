//! Stream metadata probing via ffprobe.
//!
//! Probing is a read-only query performed once per task before planning.
//! The prober never raises: any ffprobe failure yields an empty `MediaInfo`
//! and a warning in the log, and the caller decides whether an empty probe
//! is fatal for the task at hand.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use mediaforge_core::config::engine::EngineConfig;

/// Kind of a probed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Video stream.
    Video,
    /// Audio stream.
    Audio,
    /// Subtitle stream.
    Subtitle,
    /// Anything else (data, attachments).
    Other,
}

/// One probed stream.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream kind.
    pub kind: StreamKind,
    /// Codec name as reported by the engine.
    pub codec_name: String,
    /// Frame width, video streams only.
    pub width: Option<u32>,
    /// Frame height, video streams only.
    pub height: Option<u32>,
    /// Stream bitrate in bits per second, when reported.
    pub bit_rate: Option<u64>,
}

/// Read-only snapshot of probed container/stream metadata. Produced once per
/// task, never mutated, discarded with the task's workspace.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    /// Container duration in seconds (0 when unknown).
    pub duration_secs: f64,
    /// Container size in bytes (0 when unknown).
    pub size_bytes: u64,
    /// Container bitrate in bits per second (0 when unknown).
    pub bit_rate: u64,
    /// Probed streams in container order.
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    /// Whether the probe yielded nothing usable.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// First video stream, if any.
    pub fn video_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Video)
    }

    /// First audio stream, if any.
    pub fn audio_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Audio)
    }

    /// Whether the container has an audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_stream().is_some()
    }

    /// Whether the container has a video stream.
    pub fn has_video(&self) -> bool {
        self.video_stream().is_some()
    }
}

/// ffprobe wrapper.
#[derive(Debug, Clone)]
pub struct MediaProber {
    ffprobe_path: String,
}

impl MediaProber {
    /// Create a prober from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }

    /// Probe a local file. Returns an empty `MediaInfo` on any failure.
    pub async fn probe(&self, path: &Path) -> MediaInfo {
        match self.try_probe(path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ffprobe failed, returning empty probe");
                MediaInfo::default()
            }
        }
    }

    async fn try_probe(&self, path: &Path) -> Result<MediaInfo, std::io::Error> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "ffprobe exited with {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let raw: RawProbe = serde_json::from_slice(&output.stdout)
            .map_err(|e| std::io::Error::other(format!("unparseable ffprobe output: {e}")))?;

        let info = raw.into_media_info();
        debug!(
            path = %path.display(),
            duration_secs = info.duration_secs,
            streams = info.streams.len(),
            "Probed media"
        );
        Ok(info)
    }
}

// ffprobe prints every numeric field as a JSON string.

#[derive(Debug, Deserialize)]
struct RawProbe {
    #[serde(default)]
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    bit_rate: Option<String>,
}

impl RawProbe {
    fn into_media_info(self) -> MediaInfo {
        let format = self.format.unwrap_or(RawFormat {
            duration: None,
            size: None,
            bit_rate: None,
        });

        MediaInfo {
            duration_secs: format
                .duration
                .and_then(|d| d.parse().ok())
                .unwrap_or(0.0),
            size_bytes: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            bit_rate: format.bit_rate.and_then(|b| b.parse().ok()).unwrap_or(0),
            streams: self
                .streams
                .into_iter()
                .map(|s| StreamInfo {
                    kind: match s.codec_type.as_deref() {
                        Some("video") => StreamKind::Video,
                        Some("audio") => StreamKind::Audio,
                        Some("subtitle") => StreamKind::Subtitle,
                        _ => StreamKind::Other,
                    },
                    codec_name: s.codec_name.unwrap_or_default(),
                    width: s.width,
                    height: s.height,
                    bit_rate: s.bit_rate.and_then(|b| b.parse().ok()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_probe_parsing() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "bit_rate": "4000000"},
                {"codec_type": "audio", "codec_name": "aac", "bit_rate": "128000"}
            ],
            "format": {"duration": "60.500000", "size": "31000000", "bit_rate": "4100000"}
        }"#;
        let raw: RawProbe = serde_json::from_str(json).expect("parse");
        let info = raw.into_media_info();

        assert_eq!(info.duration_secs, 60.5);
        assert_eq!(info.size_bytes, 31_000_000);
        assert!(info.has_video());
        assert!(info.has_audio());
        assert_eq!(info.video_stream().unwrap().width, Some(1920));
    }

    #[test]
    fn test_empty_probe() {
        let raw: RawProbe = serde_json::from_str("{}").expect("parse");
        let info = raw.into_media_info();
        assert!(info.is_empty());
        assert_eq!(info.duration_secs, 0.0);
    }

    #[tokio::test]
    async fn test_probe_missing_binary_yields_empty() {
        let config = EngineConfig {
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..Default::default()
        };
        let prober = MediaProber::new(&config);
        let info = prober.probe(Path::new("/nonexistent/input.mp4")).await;
        assert!(info.is_empty());
    }
}
