//! Pre-flight checks and upload planning for a submission.
//!
//! Everything here runs before any network call. Rules are evaluated in
//! order and the first failure is reported.

use crate::media::preview_reference;
use crate::models::{Insight, PendingFile};

use super::draft::ComposerDraft;
use super::ComposerError;

pub const DEFAULT_READING_TIME: u32 = 10;

pub(crate) const MSG_TITLE_REQUIRED: &str = "At least one title (video or article) is required.";
pub(crate) const MSG_VIDEO_URL_REQUIRED: &str = "Please provide a video URL";
pub(crate) const MSG_VIDEO_URL_INVALID: &str = "Please provide a valid video URL";
pub(crate) const MSG_VIDEO_FILES_REQUIRED: &str =
    "Video requires both thumbnail and video file when uploading";
pub(crate) const MSG_ARTICLE_THUMBNAIL_REQUIRED: &str = "Article requires a thumbnail image";

/// Which reference field an upload fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    VideoThumbnail,
    VideoFile,
    ArticleThumbnail,
}

impl MediaSlot {
    pub fn label(self) -> &'static str {
        match self {
            MediaSlot::VideoThumbnail => "video thumbnail",
            MediaSlot::VideoFile => "video file",
            MediaSlot::ArticleThumbnail => "article thumbnail",
        }
    }
}

/// References the record will carry unless an upload replaces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct References {
    pub video_thumbnail: String,
    pub video_url: String,
    pub article_thumbnail: String,
}

impl References {
    pub fn set(&mut self, slot: MediaSlot, reference: String) {
        match slot {
            MediaSlot::VideoThumbnail => self.video_thumbnail = reference,
            MediaSlot::VideoFile => self.video_url = reference,
            MediaSlot::ArticleThumbnail => self.article_thumbnail = reference,
        }
    }
}

/// Outcome of validation: what to upload, in order, and what to keep.
#[derive(Debug, Clone)]
pub(crate) struct SubmissionPlan {
    pub uploads: Vec<(MediaSlot, PendingFile)>,
    pub references: References,
    pub reading_time: u32,
}

/// Parse the typed reading time the way a lenient number input would: leading
/// digits count, anything else (or zero) falls back to the default.
pub fn parse_reading_time(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .ok()
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_READING_TIME)
}

/// Uploaded (non-external) references of the stored video, if any.
fn retained_upload(original: Option<&Insight>) -> (String, String) {
    original
        .and_then(|i| i.video.as_ref())
        .filter(|v| !v.is_external)
        .map(|v| (v.thumbnail.clone(), v.url.clone()))
        .unwrap_or_default()
}

fn stored_external(original: Option<&Insight>) -> bool {
    original
        .and_then(|i| i.video.as_ref())
        .is_some_and(|v| v.is_external)
}

/// Thumbnail for an external link: a stored thumbnail for the same link wins,
/// then the derived preview.
fn external_thumbnail(url: &str, original: Option<&Insight>) -> String {
    let stored = original
        .and_then(|i| i.video.as_ref())
        .filter(|v| v.is_external && v.url == url && !v.thumbnail.is_empty())
        .map(|v| v.thumbnail.clone());
    stored
        .or_else(|| preview_reference(url))
        .unwrap_or_default()
}

pub(crate) fn validate(
    draft: &ComposerDraft,
    original: Option<&Insight>,
) -> Result<SubmissionPlan, ComposerError> {
    let is_new = original.and_then(|i| i.id.as_ref()).is_none();
    let has_video = draft.has_video();
    let has_article = draft.has_article();

    if !has_video && !has_article {
        return Err(ComposerError::Validation(MSG_TITLE_REQUIRED.to_string()));
    }

    let mut references = References {
        article_thumbnail: original
            .and_then(|i| i.article.as_ref())
            .map(|a| a.thumbnail.clone())
            .unwrap_or_default(),
        ..Default::default()
    };
    let mut uploads = Vec::new();

    if has_video {
        if draft.is_external() {
            let url = draft.video_url.trim();
            if url.is_empty() {
                return Err(ComposerError::Validation(MSG_VIDEO_URL_REQUIRED.to_string()));
            }
            if url::Url::parse(url).is_err() {
                return Err(ComposerError::Validation(MSG_VIDEO_URL_INVALID.to_string()));
            }
            // External mode never carries an uploaded video reference.
            references.video_url = url.to_string();
            references.video_thumbnail = external_thumbnail(url, original);
        } else {
            let (thumbnail, url) = retained_upload(original);
            // Files are mandatory for new records and when leaving an external video.
            let files_required = is_new || stored_external(original);
            let missing_thumbnail = draft.video_thumbnail_file.is_none() && thumbnail.is_empty();
            let missing_video = draft.video_file.is_none() && url.is_empty();
            if files_required && (missing_thumbnail || missing_video) {
                return Err(ComposerError::Validation(MSG_VIDEO_FILES_REQUIRED.to_string()));
            }
            references.video_thumbnail = thumbnail;
            references.video_url = url;
        }
    }

    if has_article && is_new && draft.article_thumbnail_file.is_none() {
        return Err(ComposerError::Validation(
            MSG_ARTICLE_THUMBNAIL_REQUIRED.to_string(),
        ));
    }

    if has_video {
        if let Some(file) = &draft.video_thumbnail_file {
            uploads.push((MediaSlot::VideoThumbnail, file.clone()));
        }
        if !draft.is_external() {
            if let Some(file) = &draft.video_file {
                uploads.push((MediaSlot::VideoFile, file.clone()));
            }
        }
    }
    if has_article {
        if let Some(file) = &draft.article_thumbnail_file {
            uploads.push((MediaSlot::ArticleThumbnail, file.clone()));
        }
    }

    Ok(SubmissionPlan {
        uploads,
        references,
        reading_time: parse_reading_time(&draft.article_time),
    })
}
