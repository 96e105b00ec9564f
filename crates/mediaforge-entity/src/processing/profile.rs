//! Quality profiles and audio output codecs.

use serde::{Deserialize, Serialize};

/// Video quality profile. Each profile fixes a resolution ceiling, a
/// quality factor, an encoder speed preset, and an audio bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityProfile {
    /// 256×144 ceiling.
    #[serde(rename = "144p")]
    P144,
    /// 426×240 ceiling.
    #[serde(rename = "240p")]
    P240,
    /// 640×360 ceiling.
    #[serde(rename = "360p")]
    P360,
    /// 854×480 ceiling.
    #[serde(rename = "480p")]
    P480,
    /// 1280×720 ceiling.
    #[serde(rename = "720p")]
    P720,
    /// 1920×1080 ceiling.
    #[serde(rename = "1080p")]
    P1080,
}

impl QualityProfile {
    /// Target frame height.
    pub fn height(&self) -> u32 {
        match self {
            Self::P144 => 144,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    /// Target frame width (16:9).
    pub fn width(&self) -> u32 {
        match self {
            Self::P144 => 256,
            Self::P240 => 426,
            Self::P360 => 640,
            Self::P480 => 854,
            Self::P720 => 1280,
            Self::P1080 => 1920,
        }
    }

    /// Constant rate factor for the video encoder. Lower profiles accept
    /// more compression.
    pub fn crf(&self) -> u32 {
        match self {
            Self::P144 => 32,
            Self::P240 => 30,
            Self::P360 => 28,
            Self::P480 => 26,
            Self::P720 => 23,
            Self::P1080 => 21,
        }
    }

    /// Encoder speed preset.
    pub fn preset(&self) -> &'static str {
        match self {
            Self::P144 | Self::P240 | Self::P360 => "faster",
            Self::P480 | Self::P720 => "fast",
            Self::P1080 => "medium",
        }
    }

    /// Audio bitrate paired with the profile.
    pub fn audio_bitrate(&self) -> &'static str {
        match self {
            Self::P144 | Self::P240 => "64k",
            Self::P360 | Self::P480 => "96k",
            Self::P720 => "128k",
            Self::P1080 => "192k",
        }
    }

    /// Profile label as submitted ("720p").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P144 => "144p",
            Self::P240 => "240p",
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

/// Output codec for audio-only tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// Lossy MP3.
    Mp3,
    /// Lossless FLAC.
    Flac,
    /// Modern lossy Opus.
    Opus,
}

impl AudioCodec {
    /// Encoder name passed to the engine.
    pub fn encoder(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Flac => "flac",
            Self::Opus => "libopus",
        }
    }

    /// Bitrate argument; lossless output carries none.
    pub fn bitrate(&self) -> Option<&'static str> {
        match self {
            Self::Mp3 => Some("192k"),
            Self::Flac => None,
            Self::Opus => Some("128k"),
        }
    }

    /// Output container extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Opus => "opus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serde_label() {
        let profile: QualityProfile = serde_json::from_value(serde_json::json!("720p")).expect("720p");
        assert_eq!(profile, QualityProfile::P720);
        assert_eq!(profile.width(), 1280);
        assert_eq!(profile.height(), 720);
    }

    #[test]
    fn test_lossless_has_no_bitrate() {
        assert_eq!(AudioCodec::Flac.bitrate(), None);
        assert!(AudioCodec::Mp3.bitrate().is_some());
        assert!(AudioCodec::Opus.bitrate().is_some());
    }
}
