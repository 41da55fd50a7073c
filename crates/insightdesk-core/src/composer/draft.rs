use serde::{Deserialize, Serialize};

use crate::markup::MarkupBuffer;
use crate::media::{MediaPreview, MediaUrlResolver};
use crate::models::{Insight, InsightCategory, PendingFile};

const DEFAULT_ARTICLE_CONTENT: &str = "<p></p>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerMode {
    #[default]
    Add,
    Edit,
    View,
}

/// Where the video of an insight lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// Files picked locally and sent to the upload endpoint.
    #[default]
    Uploaded,
    /// A link to a third-party video host.
    External,
}

/// Field values of the authoring form. Files are held in memory until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerDraft {
    pub category: InsightCategory,
    pub video_title: String,
    pub video_source: VideoSource,
    /// Only meaningful in external mode.
    pub video_url: String,
    pub video_thumbnail_file: Option<PendingFile>,
    pub video_file: Option<PendingFile>,
    pub article_title: String,
    pub article_description: String,
    /// Reading time as typed; parsed on submit.
    pub article_time: String,
    pub article_thumbnail_file: Option<PendingFile>,
    pub article_content: MarkupBuffer,
}

impl Default for ComposerDraft {
    fn default() -> Self {
        Self {
            category: InsightCategory::default(),
            video_title: String::new(),
            video_source: VideoSource::default(),
            video_url: String::new(),
            video_thumbnail_file: None,
            video_file: None,
            article_title: String::new(),
            article_description: String::new(),
            article_time: String::new(),
            article_thumbnail_file: None,
            article_content: MarkupBuffer::new(DEFAULT_ARTICLE_CONTENT),
        }
    }
}

impl ComposerDraft {
    /// Pre-populate from a stored insight (edit and view modes).
    pub fn from_insight(insight: &Insight) -> Self {
        let mut draft = Self {
            category: insight.category,
            ..Self::default()
        };

        if let Some(video) = &insight.video {
            draft.video_title = video.title.clone();
            if video.is_external {
                draft.video_source = VideoSource::External;
                draft.video_url = video.url.clone();
            }
        }

        if let Some(article) = &insight.article {
            draft.article_title = article.title.clone();
            draft.article_description = article.description.clone();
            if article.time > 0 {
                draft.article_time = article.time.to_string();
            }
            if !article.content.is_empty() {
                draft.article_content = MarkupBuffer::new(article.content.clone());
            }
        }

        draft
    }

    pub fn is_external(&self) -> bool {
        self.video_source == VideoSource::External
    }

    pub fn has_video(&self) -> bool {
        !self.video_title.trim().is_empty()
    }

    pub fn has_article(&self) -> bool {
        !self.article_title.trim().is_empty()
    }

    /// Thumbnail preview derived from the external URL, if it is recognized.
    pub fn external_preview(&self) -> Option<MediaPreview> {
        if !self.is_external() || self.video_url.trim().is_empty() {
            return None;
        }
        MediaPreview::external(self.video_url.trim())
    }

    /// Preview for the video slot. Local files are shown by name until uploaded.
    pub fn video_preview(
        &self,
        original: Option<&Insight>,
        resolver: &MediaUrlResolver,
    ) -> Option<MediaPreview> {
        if self.is_external() {
            return self.external_preview();
        }
        if let Some(file) = &self.video_file {
            return Some(MediaPreview::video(file.file_name.clone()));
        }
        original
            .and_then(|i| i.video.as_ref())
            .filter(|v| !v.is_external && !v.url.is_empty())
            .map(|v| MediaPreview::video(resolver.resolve(&v.url)))
    }

    pub fn video_thumbnail_preview(
        &self,
        original: Option<&Insight>,
        resolver: &MediaUrlResolver,
    ) -> Option<MediaPreview> {
        if let Some(file) = &self.video_thumbnail_file {
            return Some(MediaPreview::image(file.file_name.clone()));
        }
        if let Some(preview) = self.external_preview() {
            return Some(preview);
        }
        original
            .and_then(|i| i.video.as_ref())
            .filter(|v| !v.thumbnail.is_empty())
            .map(|v| MediaPreview::image(resolver.resolve(&v.thumbnail)))
    }

    pub fn article_thumbnail_preview(
        &self,
        original: Option<&Insight>,
        resolver: &MediaUrlResolver,
    ) -> Option<MediaPreview> {
        if let Some(file) = &self.article_thumbnail_file {
            return Some(MediaPreview::image(file.file_name.clone()));
        }
        original
            .and_then(|i| i.article.as_ref())
            .filter(|a| !a.thumbnail.is_empty())
            .map(|a| MediaPreview::image(resolver.resolve(&a.thumbnail)))
    }
}
