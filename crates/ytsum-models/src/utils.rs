//! Utility functions for YouTube URL parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Characters allowed in a YouTube video id.
const ID_CHARS: &str = "[A-Za-z0-9_-]";

/// Recognised input shapes, tried in order. The first match wins.
static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    // The id must be followed by a non-id character or the end of input so
    // that longer tokens are never truncated to 11 characters.
    let tail = "(?:[^A-Za-z0-9_-]|$)";
    [
        format!("^({ID_CHARS}{{11}})$"),
        format!("[?&]v=({ID_CHARS}{{11}}){tail}"),
        format!("youtu\\.be/({ID_CHARS}{{11}}){tail}"),
        format!("/embed/({ID_CHARS}{{11}}){tail}"),
        format!("/shorts/({ID_CHARS}{{11}}){tail}"),
        format!("/v/({ID_CHARS}{{11}}){tail}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid video id pattern"))
    .collect()
});

/// Extract an 11-character YouTube video id from a URL or a bare id.
///
/// Supports:
/// - `dQw4w9WgXcQ`
/// - `https://www.youtube.com/watch?v=VIDEO_ID`
/// - `https://youtu.be/VIDEO_ID`
/// - `https://www.youtube.com/embed/VIDEO_ID`
/// - `https://www.youtube.com/shorts/VIDEO_ID`
/// - `https://www.youtube.com/v/VIDEO_ID`
///
/// Query parameters and fragments after the id are ignored.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_success_cases() {
        // Bare id
        assert_eq!(extract_video_id("dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));

        // youtu.be format
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // watch format with trailing parameters
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // v= not the first parameter
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // Embed format
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?start=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // Shorts format
        assert_eq!(
            extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // /v/ format
        assert_eq!(
            extract_video_id("https://youtube.com/v/dQw4w9WgXcQ#t=5").as_deref(),
            Some("dQw4w9WgXcQ")
        );

        // Hyphens and underscores in id
        assert_eq!(
            extract_video_id("https://youtu.be/a-b_c-d_e-f?t=30").as_deref(),
            Some("a-b_c-d_e-f")
        );
    }

    #[test]
    fn test_extract_video_id_rejects_garbage() {
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("   "), None);
        assert_eq!(extract_video_id("https://example.com"), None);

        // Too short
        assert_eq!(extract_video_id("https://youtube.com/watch?v=abc123"), None);

        // Too long: never truncated to 11 characters
        assert_eq!(extract_video_id("https://youtu.be/abc123def456789"), None);
        assert_eq!(extract_video_id("dQw4w9WgXcQX"), None);
    }

    #[test]
    fn test_extract_video_id_trims_whitespace() {
        assert_eq!(
            extract_video_id("  https://youtu.be/dQw4w9WgXcQ \n").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("dQw4w9WgXcQ"), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(
            extract_video_id(&watch_url("dQw4w9WgXcQ")).as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }
}
