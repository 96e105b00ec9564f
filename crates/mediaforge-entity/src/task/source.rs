//! Task source reference.

use serde::{Deserialize, Serialize};

use mediaforge_core::traits::transport::FileReference;

/// Where the bytes for a task come from. Exactly one of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskSource {
    /// Remote URL, fetched through the download client.
    Url {
        /// The URL to fetch.
        url: String,
        /// Opaque provider format identifier, if the submitter picked one.
        format_id: Option<String>,
    },
    /// File held by the messaging transport.
    TransportFile(FileReference),
}

impl TaskSource {
    /// Best-known display name for the source, before any rename pattern.
    pub fn display_name(&self) -> String {
        match self {
            Self::Url { url, .. } => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("download")
                .split('?')
                .next()
                .unwrap_or("download")
                .to_string(),
            Self::TransportFile(file) => file
                .file_name
                .clone()
                .unwrap_or_else(|| file.file_id.clone()),
        }
    }

    /// Size in bytes if known up front (transport references often carry it).
    pub fn known_size(&self) -> Option<u64> {
        match self {
            Self::Url { .. } => None,
            Self::TransportFile(file) => file.size_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_display_name_strips_query() {
        let source = TaskSource::Url {
            url: "https://example.com/v/clip.mp4?token=abc".to_string(),
            format_id: None,
        };
        assert_eq!(source.display_name(), "clip.mp4");
    }

    #[test]
    fn test_transport_display_name_falls_back_to_file_id() {
        let source = TaskSource::TransportFile(FileReference {
            channel_id: 1,
            message_id: 2,
            file_id: "BAAD".to_string(),
            file_name: None,
            size_bytes: Some(1024),
        });
        assert_eq!(source.display_name(), "BAAD");
        assert_eq!(source.known_size(), Some(1024));
    }

    #[test]
    fn test_source_json_round_trip() {
        let source = TaskSource::Url {
            url: "https://example.com/a.webm".to_string(),
            format_id: Some("22".to_string()),
        };
        let json = serde_json::to_value(&source).expect("serialize");
        assert_eq!(json["type"], "url");
        let back: TaskSource = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, source);
    }
}
