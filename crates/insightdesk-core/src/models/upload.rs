use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// A file chosen locally and not yet sent to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Result of a successful upload. `reference` is opaque and only ever
/// produced by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(rename = "path", alias = "reference")]
    pub reference: String,
    /// The backend already held an identical file and returned its path.
    #[serde(default, alias = "isDuplicate", alias = "duplicate")]
    pub is_duplicate: bool,
}

/// Entry in the uploaded-files listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: RecordId,
    pub path: String,
    #[serde(default, alias = "originalName", alias = "filename")]
    pub original_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_accepts_backend_shapes() {
        let a: UploadReceipt = serde_json::from_str(r#"{"path": "uploads/a.png"}"#).unwrap();
        assert_eq!(a.reference, "uploads/a.png");
        assert!(!a.is_duplicate);

        let b: UploadReceipt =
            serde_json::from_str(r#"{"path": "uploads/a.png", "isDuplicate": true}"#).unwrap();
        assert!(b.is_duplicate);
    }

    #[test]
    fn test_pending_file_size() {
        let file = PendingFile::new("clip.mp4", vec![0u8; 1024]).with_content_type("video/mp4");
        assert_eq!(file.size(), 1024);
        assert_eq!(file.content_type.as_deref(), Some("video/mp4"));
    }
}
