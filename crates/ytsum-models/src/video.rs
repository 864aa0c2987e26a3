//! Video metadata models.

use serde::{Deserialize, Serialize};

/// oEmbed-style metadata returned by the transcript backend for a video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title
    #[serde(default)]
    pub title: String,

    /// Channel name
    #[serde(default)]
    pub author_name: String,

    /// Channel URL
    #[serde(default)]
    pub author_url: String,

    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail_url: String,
}

impl VideoMetadata {
    /// Best-effort display title, falling back to the video id.
    pub fn display_title<'a>(&'a self, video_id: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            video_id
        } else {
            self.title.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_deserializes_backend_shape() {
        let json = r#"{
            "title": "Never Gonna Give You Up",
            "author_name": "Rick Astley",
            "author_url": "https://www.youtube.com/@RickAstleyYT",
            "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        }"#;

        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.author_name, "Rick Astley");
        assert_eq!(meta.display_title("dQw4w9WgXcQ"), "Never Gonna Give You Up");
    }

    #[test]
    fn test_metadata_missing_fields_default() {
        let meta: VideoMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, VideoMetadata::default());
        assert_eq!(meta.display_title("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }
}
