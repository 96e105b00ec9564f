//! Declarative per-task processing configuration.
//!
//! Every field is independently optional and composable. Unknown keys are
//! preserved in the residual bag rather than rejected, so an upstream UI can
//! introduce options before the pipeline learns about them.

pub mod filters;
pub mod profile;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::source::TaskSource;

pub use filters::AudioFilterSet;
pub use profile::{AudioCodec, QualityProfile};

/// Recognized processing options for one task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Target quality profile; selecting one forces a re-encode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityProfile>,
    /// Strip the audio track from the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    /// Time window to keep, `"HH:MM:SS-HH:MM:SS"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<TrimRange>,
    /// Split criterion: duration (`"90s"`) or target segment size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitSpec>,
    /// Animated-image output parameters. Takes exclusive precedence over
    /// every general-form option when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif: Option<GifSpec>,
    /// Output audio codec for audio-only tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<AudioCodec>,
    /// Composable audio effect toggles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_filters: Option<AudioFilterSet>,
    /// Additional sources concatenated after the primary one (join tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_parts: Option<Vec<TaskSource>>,
    /// External audio track mixed in as an additional input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_audio: Option<TaskSource>,
    /// External subtitle track muxed in as an additional input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_subtitle: Option<TaskSource>,
    /// Watermark text drawn over the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
    /// Output display name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    /// Egress caption text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Ask the egress transport to attach a thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<bool>,
    /// Unrecognized keys, preserved verbatim for forward compatibility.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProcessingConfig {
    /// Whether audio should be stripped from the output.
    pub fn is_muted(&self) -> bool {
        self.mute.unwrap_or(false)
    }

    /// Whether any audio effect is enabled.
    pub fn has_audio_effects(&self) -> bool {
        self.audio_filters.as_ref().is_some_and(|f| f.any_enabled())
    }
}

/// Inclusive time window, parsed from `"HH:MM:SS-HH:MM:SS"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrimRange {
    /// Window start timecode.
    pub start: String,
    /// Window end timecode.
    pub end: String,
}

impl TrimRange {
    /// Start of the window in seconds.
    pub fn start_seconds(&self) -> Option<f64> {
        parse_timecode(&self.start)
    }

    /// End of the window in seconds.
    pub fn end_seconds(&self) -> Option<f64> {
        parse_timecode(&self.end)
    }
}

impl TryFrom<String> for TrimRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| format!("trim range must be 'start-end', got '{value}'"))?;
        let range = Self {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        };
        if range.start_seconds().is_none() || range.end_seconds().is_none() {
            return Err(format!("invalid timecode in trim range '{value}'"));
        }
        if range.end_seconds() <= range.start_seconds() {
            return Err(format!("trim range '{value}' ends before it starts"));
        }
        Ok(range)
    }
}

impl From<TrimRange> for String {
    fn from(range: TrimRange) -> Self {
        format!("{}-{}", range.start, range.end)
    }
}

/// Split criterion for segmenting output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SplitSpecRaw", into = "SplitSpecRaw")]
pub enum SplitSpec {
    /// Segment every N seconds (keyframe-aligned stream copy).
    Duration {
        /// Segment length in seconds.
        seconds: u32,
    },
    /// Target segment size in bytes. Best-effort: converted to an estimated
    /// duration from the probed bitrate, never byte-accurate.
    Size {
        /// Target segment size in bytes.
        bytes: u64,
    },
}

/// Wire form of [`SplitSpec`]: a `"90s"` string or a plain byte count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SplitSpecRaw {
    /// Textual form, `s` suffix marks seconds.
    Text(String),
    /// Numeric form, bytes.
    Number(u64),
}

impl TryFrom<SplitSpecRaw> for SplitSpec {
    type Error = String;

    fn try_from(raw: SplitSpecRaw) -> Result<Self, Self::Error> {
        match raw {
            SplitSpecRaw::Number(bytes) => Ok(Self::Size { bytes }),
            SplitSpecRaw::Text(text) => {
                let trimmed = text.trim();
                if let Some(secs) = trimmed.strip_suffix(['s', 'S']) {
                    let seconds: u32 = secs
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid split duration '{text}'"))?;
                    if seconds == 0 {
                        return Err("split duration must be positive".to_string());
                    }
                    Ok(Self::Duration { seconds })
                } else {
                    let bytes: u64 = trimmed
                        .parse()
                        .map_err(|_| format!("invalid split size '{text}'"))?;
                    Ok(Self::Size { bytes })
                }
            }
        }
    }
}

impl From<SplitSpec> for SplitSpecRaw {
    fn from(spec: SplitSpec) -> Self {
        match spec {
            SplitSpec::Duration { seconds } => Self::Text(format!("{seconds}s")),
            SplitSpec::Size { bytes } => Self::Number(bytes),
        }
    }
}

/// Animated-image output parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifSpec {
    /// Window start timecode; beginning of the source when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Window length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Output frame rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

/// Parse `HH:MM:SS`, `MM:SS`, or bare seconds (fractions allowed) into
/// seconds.
pub fn parse_timecode(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() > 3 || parts.is_empty() {
        return None;
    }
    let mut seconds = 0.0;
    for part in &parts {
        let value: f64 = part.parse().ok()?;
        if value < 0.0 {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode_forms() {
        assert_eq!(parse_timecode("00:00:10"), Some(10.0));
        assert_eq!(parse_timecode("01:30"), Some(90.0));
        assert_eq!(parse_timecode("7.5"), Some(7.5));
        assert_eq!(parse_timecode("1:00:00"), Some(3600.0));
        assert_eq!(parse_timecode("bad"), None);
        assert_eq!(parse_timecode("1:2:3:4"), None);
    }

    #[test]
    fn test_trim_range_from_string() {
        let range: TrimRange = "00:00:10-00:00:20".to_string().try_into().expect("parse");
        assert_eq!(range.start_seconds(), Some(10.0));
        assert_eq!(range.end_seconds(), Some(20.0));

        assert!(TrimRange::try_from("00:00:20-00:00:10".to_string()).is_err());
        assert!(TrimRange::try_from("nonsense".to_string()).is_err());
    }

    #[test]
    fn test_split_spec_forms() {
        let by_duration: SplitSpec = serde_json::from_value(serde_json::json!("90s")).expect("90s");
        assert_eq!(by_duration, SplitSpec::Duration { seconds: 90 });

        let by_size: SplitSpec =
            serde_json::from_value(serde_json::json!(50_000_000u64)).expect("bytes");
        assert_eq!(by_size, SplitSpec::Size { bytes: 50_000_000 });

        let text_size: SplitSpec =
            serde_json::from_value(serde_json::json!("1000000")).expect("text bytes");
        assert_eq!(text_size, SplitSpec::Size { bytes: 1_000_000 });
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let json = serde_json::json!({
            "quality": "720p",
            "sticker_pack": "future-option",
        });
        let config: ProcessingConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(config.quality, Some(QualityProfile::P720));
        assert_eq!(
            config.extra.get("sticker_pack").and_then(|v| v.as_str()),
            Some("future-option")
        );

        let back = serde_json::to_value(&config).expect("serialize");
        assert_eq!(back["sticker_pack"], "future-option");
    }
}
