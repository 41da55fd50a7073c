//! HTTP client for the insightdesk admin backend.
//!
//! Provides a minimal client with optional bearer auth, generic JSON helpers
//! and the domain methods (insights, team, uploads, auth, whitelist). The
//! client implements the collaborator traits of `insightdesk_core`, so the
//! composer can drive it directly.

pub mod api;
mod upload;

use std::time::Duration;

use insightdesk_core::config::ClientConfig;
use insightdesk_core::error::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

pub use upload::guess_content_type;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// No credentials (login, registration)
    Anonymous,
}

/// HTTP client for the admin API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
    max_upload_bytes: u64,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> AppResult<Self> {
        Self::with_config(&ClientConfig::for_base_url(&base_url), auth)
    }

    fn with_config(config: &ClientConfig, auth: Auth) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Client for `config`, authenticated when it carries a token.
    pub fn from_config(config: &ClientConfig) -> AppResult<Self> {
        let auth = match &config.api_token {
            Some(token) => Auth::Bearer(token.clone()),
            None => Auth::Anonymous,
        };
        Self::with_config(config, auth)
    }

    /// Create client from environment: INSIGHTDESK_API_URL (or API_URL), INSIGHTDESK_TOKEN.
    pub fn from_env() -> AppResult<Self> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, Auth::Bearer(_))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::Anonymous => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Transfer(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_from_response(status, &body);
        tracing::debug!(status = %status, error = %err, "API request failed");
        Err(err)
    }

    /// Response body as JSON; an empty body reads as `null`.
    async fn read_value(response: Response) -> AppResult<serde_json::Value> {
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transfer(format!("Failed to read response: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::Transfer(format!("Failed to parse response as JSON: {}", e)))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json()
            .await
            .map_err(|e| AppError::Transfer(format!("Failed to parse response as JSON: {}", e)))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    /// POST JSON body and return the (possibly empty) JSON response.
    pub async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<serde_json::Value> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Self::read_value(response).await
    }

    /// PUT JSON body and return the (possibly empty) JSON response.
    pub async fn put_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<serde_json::Value> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Self::read_value(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> AppResult<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let request = self.client.delete(self.build_url(path));
        self.send(request).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body: `{"error": ...}`,
/// `{"message": ...}` or the raw text.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = server_message(body);
    let or = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
            AppError::Validation(or("The server rejected the request"))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Unauthorized(or("Session expired; log in again"))
        }
        StatusCode::NOT_FOUND => AppError::NotFound(or("Resource not found")),
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(or("File exceeds the upload size limit"))
        }
        _ => AppError::Transfer(or(&format!("API request failed with status {}", status))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_shapes() {
        assert_eq!(
            server_message(r#"{"error": "Email already whitelisted"}"#).as_deref(),
            Some("Email already whitelisted")
        );
        assert_eq!(
            server_message(r#"{"message": "nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(server_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(server_message(r#"{"code": 1}"#), None);
        assert_eq!(server_message("  "), None);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_from_response(StatusCode::UNPROCESSABLE_ENTITY, r#"{"error": "Title required"}"#),
            AppError::Validation(ref m) if m == "Title required"
        ));
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, ""),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::PAYLOAD_TOO_LARGE, ""),
            AppError::PayloadTooLarge(_)
        ));
        match error_from_response(StatusCode::BAD_GATEWAY, "") {
            AppError::Transfer(m) => assert!(m.contains("502")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/api/".to_string(), Auth::Anonymous)
            .unwrap();
        assert_eq!(client.build_url("/insights"), "http://localhost:3000/api/insights");
        assert!(!client.is_authenticated());
        assert_eq!(client.max_upload_bytes(), 50 * 1024 * 1024);
    }
}
