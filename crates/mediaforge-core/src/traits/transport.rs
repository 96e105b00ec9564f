//! Messaging transport collaborator interface.
//!
//! The transport owns byte movement between the messaging platform and the
//! local filesystem. Small/large payload routing happens inside the
//! implementation; the pipeline only asserts that a local file results.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::traits::ProgressFn;

/// Reference to a file held by the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Channel/chat the message containing the file lives in.
    pub channel_id: i64,
    /// Message id within the channel.
    pub message_id: i64,
    /// Transport-scoped opaque file id.
    pub file_id: String,
    /// Original file name, if the transport knows it.
    pub file_name: Option<String>,
    /// Size in bytes, if the transport knows it.
    pub size_bytes: Option<u64>,
}

/// Kind of artifact being handed to the egress channel. Drives how the
/// transport presents the file (player, document, animation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Playable video.
    Video,
    /// Playable audio.
    Audio,
    /// Opaque document/file.
    Document,
    /// Soundless animation.
    Animation,
}

impl ArtifactKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Animation => "animation",
        }
    }
}

/// Finished-artifact handoff request.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// Destination chat/channel.
    pub chat_id: i64,
    /// Local path of the artifact to deliver.
    pub path: PathBuf,
    /// Presentation kind.
    pub kind: ArtifactKind,
    /// Display name shown to the recipient.
    pub display_name: String,
    /// Optional caption text.
    pub caption: Option<String>,
    /// Whether the transport should attach a generated thumbnail.
    pub with_thumbnail: bool,
}

/// File-fetch and artifact-delivery capability of the messaging transport.
#[async_trait]
pub trait TransportClient: Send + Sync + std::fmt::Debug {
    /// Fetch the referenced file to `dest`, reporting progress.
    async fn fetch(
        &self,
        file: &FileReference,
        dest: &Path,
        progress: &ProgressFn,
    ) -> AppResult<PathBuf>;

    /// Deliver a finished artifact to its destination chat.
    async fn deliver(&self, request: &DeliveryRequest, progress: &ProgressFn) -> AppResult<()>;
}
