use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Identifier assigned by the backend. Some deployments emit numbers, others
/// strings; both are kept as text since the id only ever appears in paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => RecordId(s),
            Raw::Number(n) => RecordId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum InsightCategory {
    #[default]
    AI,
    Technology,
    Mobile,
    Cloud,
}

impl InsightCategory {
    pub const ALL: [InsightCategory; 4] = [
        InsightCategory::AI,
        InsightCategory::Technology,
        InsightCategory::Mobile,
        InsightCategory::Cloud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::AI => "AI",
            InsightCategory::Technology => "Technology",
            InsightCategory::Mobile => "Mobile",
            InsightCategory::Cloud => "Cloud",
        }
    }
}

impl Display for InsightCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Accepts any casing, like the command-line parser does.
impl<'de> Deserialize<'de> for InsightCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for InsightCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsightCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'. Expected one of: AI, Technology, Mobile, Cloud",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
    /// `url` is a third-party link rather than an upload reference.
    #[serde(default)]
    pub is_external: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Raw HTML, rendered as trusted markup by the site.
    #[serde(default)]
    pub content: String,
    /// Reading time in minutes.
    #[serde(default)]
    pub time: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub category: InsightCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Insight {
    pub fn video_title(&self) -> Option<&str> {
        self.video
            .as_ref()
            .map(|v| v.title.as_str())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn article_title(&self) -> Option<&str> {
        self.article
            .as_ref()
            .map(|a| a.title.as_str())
            .filter(|t| !t.trim().is_empty())
    }

    /// A persisted insight needs at least one titled section.
    pub fn is_valid(&self) -> bool {
        self.video_title().is_some() || self.article_title().is_some()
    }

    /// Title shown in listings: the video title, else the article title.
    pub fn display_title(&self) -> &str {
        self.video_title().or(self.article_title()).unwrap_or("")
    }

    /// Listing label describing which sections are present.
    pub fn kind_label(&self) -> &'static str {
        match (self.video.is_some(), self.article.is_some()) {
            (true, true) => "Video & Article",
            (true, false) => "Video",
            (false, true) => "Article",
            (false, false) => "Empty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_wire_shape() {
        let insight = Insight {
            id: None,
            category: InsightCategory::Cloud,
            video: Some(VideoSection {
                title: "Intro".to_string(),
                thumbnail: "uploads/t.png".to_string(),
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                is_external: true,
            }),
            article: None,
            created_at: None,
        };

        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["category"], "Cloud");
        assert_eq!(json["video"]["isExternal"], true);
        assert!(json.get("article").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_numeric_and_text_ids() {
        let a: Insight = serde_json::from_str(r#"{"id": 42, "category": "AI"}"#).unwrap();
        let b: Insight = serde_json::from_str(r#"{"id": "abc", "category": "Mobile"}"#).unwrap();
        assert_eq!(a.id, Some(RecordId::from(42)));
        assert_eq!(b.id.unwrap().as_str(), "abc");
        assert_eq!(b.category, InsightCategory::Mobile);
    }

    #[test]
    fn test_category_wire_value_ignores_case() {
        let a: Insight = serde_json::from_str(r#"{"category": "ai"}"#).unwrap();
        let b: Insight = serde_json::from_str(r#"{"category": "CLOUD"}"#).unwrap();
        assert_eq!(a.category, InsightCategory::AI);
        assert_eq!(b.category, InsightCategory::Cloud);
        assert!(serde_json::from_str::<InsightCategory>(r#""Quantum""#).is_err());
    }

    #[test]
    fn test_validity_and_labels() {
        let mut insight = Insight::default();
        assert!(!insight.is_valid());
        assert_eq!(insight.kind_label(), "Empty");

        insight.article = Some(ArticleSection {
            title: "Edge AI".to_string(),
            ..Default::default()
        });
        assert!(insight.is_valid());
        assert_eq!(insight.display_title(), "Edge AI");
        assert_eq!(insight.kind_label(), "Article");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("cloud".parse::<InsightCategory>(), Ok(InsightCategory::Cloud));
        assert_eq!(" AI ".parse::<InsightCategory>(), Ok(InsightCategory::AI));
        assert!("Quantum".parse::<InsightCategory>().is_err());
    }
}
