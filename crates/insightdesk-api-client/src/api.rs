//! Domain methods for the insightdesk API client.
//!
//! Request and response types come from `insightdesk_core::models`. The
//! collaborator traits the composer drives are implemented at the bottom.

use async_trait::async_trait;
use insightdesk_core::error::{AppError, AppResult};
use insightdesk_core::gateway::{ProgressFn, RecordRepository, TeamMemberRepository, UploadGateway};
use insightdesk_core::models::{
    Credentials, Insight, LoginResponse, Page, PendingFile, RecordId, StoredFile, TeamMember,
    UploadReceipt, WhitelistRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::Validate;

use crate::ApiClient;

/// Entry of the admin whitelist.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WhitelistItem {
    Entry(WhitelistEntry),
    Email(String),
}

impl WhitelistItem {
    fn into_email(self) -> String {
        match self {
            WhitelistItem::Entry(entry) => entry.email,
            WhitelistItem::Email(email) => email,
        }
    }
}

/// `GET /whitelist` answers with entries, plain addresses, or either one
/// wrapped in `{emails|data: [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WhitelistListing {
    Bare(Vec<WhitelistItem>),
    Wrapped {
        #[serde(alias = "data")]
        emails: Vec<WhitelistItem>,
    },
}

impl WhitelistListing {
    fn into_emails(self) -> Vec<String> {
        let (WhitelistListing::Bare(items) | WhitelistListing::Wrapped { emails: items }) = self;
        items.into_iter().map(WhitelistItem::into_email).collect()
    }
}

/// Read a saved record out of a write response. The backend may answer with
/// the record, a `{data|insight|member: record}` wrapper, or only a message;
/// in the last case the submitted record stands in.
fn saved_record<T: DeserializeOwned + Clone>(
    value: &serde_json::Value,
    wrapper_keys: &[&str],
    submitted: &T,
    is_record: impl Fn(&T) -> bool,
) -> T {
    std::iter::once(value)
        .chain(wrapper_keys.iter().filter_map(|key| value.get(*key)))
        .filter_map(|candidate| serde_json::from_value::<T>(candidate.clone()).ok())
        .find(|record| is_record(record))
        .unwrap_or_else(|| submitted.clone())
}

/// Top-level `id` of a write response, for bodies like `{"id": 7, "message": ...}`.
fn returned_id(value: &serde_json::Value) -> Option<RecordId> {
    serde_json::from_value(value.get("id")?.clone()).ok()
}

fn is_member(member: &TeamMember) -> bool {
    !member.name.is_empty()
}

fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(AppError::from)
}

impl ApiClient {
    /// `POST /auth/login`
    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginResponse> {
        validate_payload(credentials)?;
        let value = self.post_json("/auth/login", credentials).await?;
        let response: LoginResponse = serde_json::from_value(value)
            .map_err(|e| AppError::Transfer(format!("Unexpected login response: {}", e)))?;
        if response.token.is_none() {
            return Err(AppError::Unauthorized(
                response
                    .message
                    .unwrap_or_else(|| "Login failed".to_string()),
            ));
        }
        tracing::info!(email = %credentials.email, "Logged in");
        Ok(response)
    }

    /// `POST /auth/register`
    pub async fn register(&self, credentials: &Credentials) -> AppResult<()> {
        validate_payload(credentials)?;
        self.post_json("/auth/register", credentials).await?;
        tracing::info!(email = %credentials.email, "Registered");
        Ok(())
    }

    /// `GET /whitelist`
    pub async fn list_whitelist(&self) -> AppResult<Vec<String>> {
        let listing: WhitelistListing = self.get("/whitelist", &[]).await?;
        Ok(listing.into_emails())
    }

    /// `POST /whitelist`. Blank input is ignored without a request.
    pub async fn add_to_whitelist(&self, email: &str) -> AppResult<bool> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(false);
        }
        let request = WhitelistRequest {
            email: email.to_string(),
        };
        validate_payload(&request)?;
        self.post_json("/whitelist", &request).await?;
        tracing::info!(email = %email, "Whitelisted");
        Ok(true)
    }

    /// `DELETE /whitelist/{email}` with the address percent-encoded.
    pub async fn remove_from_whitelist(&self, email: &str) -> AppResult<()> {
        let path = format!("/whitelist/{}", urlencoding::encode(email.trim()));
        self.delete(&path).await?;
        tracing::info!(email = %email.trim(), "Removed from whitelist");
        Ok(())
    }

    /// `GET /files`
    pub async fn list_files(&self) -> AppResult<Vec<StoredFile>> {
        let page: Page<StoredFile> = self.get("/files", &[]).await?;
        Ok(page.items)
    }

    /// `DELETE /files/{id}`
    pub async fn delete_file(&self, id: &RecordId) -> AppResult<()> {
        self.delete(&format!("/files/{}", id)).await
    }

    /// `GET /insights/{id}`, bare or wrapped in `{data: ...}`.
    pub async fn get_insight(&self, id: &RecordId) -> AppResult<Insight> {
        let value: serde_json::Value = self.get(&format!("/insights/{}", id), &[]).await?;
        std::iter::once(&value)
            .chain(value.get("data"))
            .filter_map(|candidate| serde_json::from_value::<Insight>(candidate.clone()).ok())
            .find(Insight::is_valid)
            .ok_or_else(|| AppError::NotFound(format!("Insight {} not found in response", id)))
    }

    /// `GET /insights?page=&limit=`, `page` 1-based.
    pub async fn fetch_insights(&self, page: u32, limit: u32) -> AppResult<Page<Insight>> {
        self.get(
            "/insights",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[async_trait]
impl UploadGateway for ApiClient {
    async fn upload_file(
        &self,
        file: &PendingFile,
        on_progress: Option<ProgressFn<'_>>,
    ) -> AppResult<UploadReceipt> {
        self.upload(file, on_progress).await
    }
}

#[async_trait]
impl RecordRepository for ApiClient {
    async fn create_insight(&self, insight: &Insight) -> AppResult<Insight> {
        let value = self.post_json("/insights", insight).await?;
        let mut saved = saved_record(&value, &["data", "insight"], insight, Insight::is_valid);
        if saved.id.is_none() {
            saved.id = returned_id(&value);
        }
        tracing::info!(id = ?saved.id, title = %saved.display_title(), "Insight created");
        Ok(saved)
    }

    async fn update_insight(&self, id: &RecordId, insight: &Insight) -> AppResult<Insight> {
        let value = self.put_json(&format!("/insights/{}", id), insight).await?;
        let mut saved = saved_record(&value, &["data", "insight"], insight, Insight::is_valid);
        saved.id.get_or_insert_with(|| id.clone());
        tracing::info!(id = %id, title = %saved.display_title(), "Insight updated");
        Ok(saved)
    }

    async fn delete_insight(&self, id: &RecordId) -> AppResult<()> {
        self.delete(&format!("/insights/{}", id)).await?;
        tracing::info!(id = %id, "Insight deleted");
        Ok(())
    }

    async fn list_insights(&self, page: u32, page_size: u32) -> AppResult<Page<Insight>> {
        self.fetch_insights(page, page_size).await
    }
}

#[async_trait]
impl TeamMemberRepository for ApiClient {
    async fn list_team_members(&self) -> AppResult<Vec<TeamMember>> {
        let page: Page<TeamMember> = self.get("/team", &[]).await?;
        Ok(page.items)
    }

    async fn create_team_member(&self, member: &TeamMember) -> AppResult<TeamMember> {
        let value = self.post_json("/team", member).await?;
        let mut saved = saved_record(&value, &["data", "member"], member, is_member);
        if saved.id.is_none() {
            saved.id = value.get("id").and_then(|id| id.as_i64());
        }
        Ok(saved)
    }

    async fn update_team_member(&self, id: i64, member: &TeamMember) -> AppResult<TeamMember> {
        let value = self.put_json(&format!("/team/{}", id), member).await?;
        let mut saved = saved_record(&value, &["data", "member"], member, is_member);
        saved.id.get_or_insert(id);
        Ok(saved)
    }

    async fn delete_team_member(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("/team/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_saved_record_shapes() {
        let submitted = TeamMember {
            name: "Ada".to_string(),
            position: "CTO".to_string(),
            ..Default::default()
        };

        let direct = saved_record(
            &json!({"id": 4, "name": "Ada", "position": "CTO"}),
            &["data"],
            &submitted,
            is_member,
        );
        assert_eq!(direct.id, Some(4));

        let wrapped = saved_record(
            &json!({"message": "ok", "member": {"id": 5, "name": "Ada", "position": "CTO"}}),
            &["data", "member"],
            &submitted,
            is_member,
        );
        assert_eq!(wrapped.id, Some(5));

        let message_only = saved_record(&json!({"message": "ok"}), &["data"], &submitted, is_member);
        assert_eq!(message_only, submitted);

        let empty = saved_record(&serde_json::Value::Null, &["data"], &submitted, is_member);
        assert_eq!(empty, submitted);
    }

    #[test]
    fn test_returned_id() {
        assert_eq!(returned_id(&json!({"id": 7})), Some(RecordId::from(7)));
        assert_eq!(returned_id(&json!({"id": "abc"})), Some(RecordId::from("abc")));
        assert_eq!(returned_id(&json!({"message": "ok"})), None);
    }

    #[test]
    fn test_whitelist_listing_shapes() {
        let entries: WhitelistListing =
            serde_json::from_value(json!([{"email": "a@example.com"}])).unwrap();
        assert_eq!(entries.into_emails(), vec!["a@example.com"]);

        let bare: WhitelistListing = serde_json::from_value(json!(["b@example.com"])).unwrap();
        assert_eq!(bare.into_emails(), vec!["b@example.com"]);

        let wrapped: WhitelistListing =
            serde_json::from_value(json!({"emails": ["c@example.com"]})).unwrap();
        assert_eq!(wrapped.into_emails(), vec!["c@example.com"]);
    }
}
