//! Media reference resolution
//!
//! Recognizes external (YouTube) video links, derives their preview
//! thumbnails and turns stored upload references into displayable URLs.
//! Everything here is pure; callers recompute whenever the video URL, the
//! external flag or the selected files change.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical watch URLs (`youtube.com/watch?v=`), embed/`v/` paths, channel-style
/// paths and `youtu.be` share links; captures the 11 character video id.
static EXTERNAL_VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#)
        .expect("external video pattern is valid")
});

const THUMBNAIL_HOST: &str = "https://img.youtube.com/vi";

/// Prefix of references produced by the upload endpoint.
const UPLOAD_PREFIX: &str = "uploads/";

/// Extract the platform video id from an external video URL.
pub fn external_video_id(url: &str) -> Option<&str> {
    EXTERNAL_VIDEO_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// High-resolution preview thumbnail for an external video URL.
///
/// Returns `None` for anything that is not a recognized external video link;
/// that is not an error, the caller shows a placeholder instead.
pub fn preview_reference(url: &str) -> Option<String> {
    external_video_id(url).map(|id| format!("{}/{}/maxresdefault.jpg", THUMBNAIL_HOST, id))
}

/// Lower-resolution thumbnail, used when the high-resolution one is missing.
pub fn fallback_preview_reference(url: &str) -> Option<String> {
    external_video_id(url).map(|id| format!("{}/{}/hqdefault.jpg", THUMBNAIL_HOST, id))
}

/// Lenient id lookup used by the preview player: also accepts thumbnail URLs
/// (`.../vi/<id>/...`) and bare `v=<id>` query fragments.
pub fn lenient_video_id(url: &str) -> Option<String> {
    // Thumbnail URLs also match the watch pattern (with the wrong id), so check them first.
    let from_thumbnail = url
        .split_once("/vi/")
        .and_then(|(_, rest)| rest.split('/').next());
    let from_pattern = || external_video_id(url);
    let from_query = || {
        url.split_once("v=")
            .and_then(|(_, rest)| rest.split('&').next())
    };

    from_thumbnail
        .filter(|id| !id.is_empty())
        .or_else(from_pattern)
        .or_else(from_query)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreviewKind {
    Image,
    Video,
    ExternalVideo,
}

/// What the authoring view shows next to a media field. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPreview {
    pub kind: PreviewKind,
    pub reference: String,
}

impl MediaPreview {
    pub fn image(reference: impl Into<String>) -> Self {
        Self {
            kind: PreviewKind::Image,
            reference: reference.into(),
        }
    }

    pub fn video(reference: impl Into<String>) -> Self {
        Self {
            kind: PreviewKind::Video,
            reference: reference.into(),
        }
    }

    /// Preview for an external link; `None` when the link is not recognized.
    pub fn external(url: &str) -> Option<Self> {
        preview_reference(url).map(|reference| Self {
            kind: PreviewKind::ExternalVideo,
            reference,
        })
    }
}

/// Turns stored references into absolute URLs.
#[derive(Debug, Clone)]
pub struct MediaUrlResolver {
    media_base_url: String,
}

impl MediaUrlResolver {
    pub fn new(media_base_url: impl Into<String>) -> Self {
        let base: String = media_base_url.into();
        Self {
            media_base_url: base.trim_end_matches('/').to_string(),
        }
    }

    /// `uploads/...` references are served from the media host; anything else
    /// is already absolute and returned as is.
    pub fn resolve(&self, reference: &str) -> String {
        if reference.is_empty() {
            return String::new();
        }
        if reference.starts_with(UPLOAD_PREFIX) {
            format!("{}/{}", self.media_base_url, reference)
        } else {
            reference.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_recognized_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/e/dQw4w9WgXcQ",
        ] {
            assert_eq!(external_video_id(url), Some(ID), "url: {}", url);
        }
    }

    #[test]
    fn test_unrecognized_input_yields_none() {
        assert_eq!(external_video_id(""), None);
        assert_eq!(external_video_id("not a url"), None);
        assert_eq!(external_video_id("https://vimeo.com/123456789"), None);
        assert_eq!(external_video_id("https://youtu.be/short"), None);
        assert_eq!(preview_reference("https://example.com/video.mp4"), None);
    }

    #[test]
    fn test_preview_reference_is_deterministic() {
        let url = "https://youtu.be/dQw4w9WgXcQ";
        let first = preview_reference(url);
        assert_eq!(
            first.as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(preview_reference(url), first);
        assert_eq!(
            fallback_preview_reference(url).as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
        );
    }

    #[test]
    fn test_lenient_video_id() {
        assert_eq!(
            lenient_video_id("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg").as_deref(),
            Some(ID)
        );
        assert_eq!(lenient_video_id("v=abc&x=1").as_deref(), Some("abc"));
        assert_eq!(lenient_video_id("https://example.com"), None);
        assert_eq!(watch_url(ID), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(embed_url(ID), "https://www.youtube.com/embed/dQw4w9WgXcQ");
    }

    #[test]
    fn test_external_preview() {
        let preview = MediaPreview::external("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(preview.kind, PreviewKind::ExternalVideo);
        assert!(preview.reference.contains(ID));
        assert!(MediaPreview::external("https://example.com").is_none());
    }

    #[test]
    fn test_resolve_media_url() {
        let resolver = MediaUrlResolver::new("https://cdn.example.com/");
        assert_eq!(
            resolver.resolve("uploads/2024/cover.png"),
            "https://cdn.example.com/uploads/2024/cover.png"
        );
        assert_eq!(
            resolver.resolve("https://img.youtube.com/vi/x/hqdefault.jpg"),
            "https://img.youtube.com/vi/x/hqdefault.jpg"
        );
        assert_eq!(resolver.resolve(""), "");
    }
}
