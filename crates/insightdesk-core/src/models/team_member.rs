use serde::{Deserialize, Serialize};

/// A member of the team page. The backend reads `imagePath` on writes and
/// returns `image_path` on reads; both spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub position: String,
    #[serde(rename = "imagePath", alias = "image_path", default)]
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_snake_case_image_path() {
        let member: TeamMember = serde_json::from_str(
            r#"{"id": 3, "name": "Ada", "position": "CTO", "image_path": "uploads/ada.png"}"#,
        )
        .unwrap();
        assert_eq!(member.id, Some(3));
        assert_eq!(member.image_path, "uploads/ada.png");
        assert!(member.bio.is_none());
    }

    #[test]
    fn test_writes_camel_case_image_path() {
        let member = TeamMember {
            id: None,
            name: "Ada".to_string(),
            position: "CTO".to_string(),
            image_path: "uploads/ada.png".to_string(),
            bio: Some("Builds things".to_string()),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["imagePath"], "uploads/ada.png");
        assert!(json.get("id").is_none());
    }
}
