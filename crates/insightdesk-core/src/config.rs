//! Configuration module
//!
//! Client configuration is read from the environment. Binaries are expected
//! to call `dotenvy::dotenv()` first so a local `.env` file is honoured.

use std::env;

use crate::error::{AppError, AppResult};

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const PAGE_SIZE: u32 = 10;

/// Upload ceiling enforced by the backend (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Settings for talking to the admin backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// REST base URL, e.g. `http://localhost:3000/api`
    pub api_base_url: String,
    /// Base URL that relative `uploads/...` references are served from
    pub media_base_url: String,
    /// Bearer token obtained from `login`
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub max_upload_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_base_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Config pointing at `api_base_url` with every other setting at its default.
    pub fn for_base_url(api_base_url: &str) -> Self {
        let api_base_url = api_base_url.trim_end_matches('/').to_string();
        Self {
            media_base_url: derive_media_base_url(&api_base_url),
            api_base_url,
            api_token: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            page_size: PAGE_SIZE,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_env() -> AppResult<Self> {
        let api_base_url = env::var("INSIGHTDESK_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mut config = Self::for_base_url(&api_base_url);

        if let Ok(media) = env::var("INSIGHTDESK_MEDIA_URL").or_else(|_| env::var("BASE_URL")) {
            config.media_base_url = media.trim_end_matches('/').to_string();
        }

        config.api_token = env::var("INSIGHTDESK_TOKEN")
            .or_else(|_| env::var("AUTH_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty());

        config.request_timeout_secs =
            parse_env("INSIGHTDESK_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?;
        config.page_size = parse_env("INSIGHTDESK_PAGE_SIZE", PAGE_SIZE)?;
        config.max_upload_bytes = parse_env("INSIGHTDESK_MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("API URL", &self.api_base_url),
            ("media URL", &self.media_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::InvalidInput(format!("Invalid {} '{}': {}", name, value, e)))?;
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(AppError::InvalidInput(
                "Page size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// The media host is the API host without its `/api` suffix.
fn derive_media_base_url(api_base_url: &str) -> String {
    api_base_url
        .strip_suffix("/api")
        .unwrap_or(api_base_url)
        .to_string()
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("{} must be a number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_media_url_strips_api_suffix() {
        let config = ClientConfig::for_base_url("https://admin.example.com/api/");
        assert_eq!(config.api_base_url, "https://admin.example.com/api");
        assert_eq!(config.media_base_url, "https://admin.example.com");
    }

    #[test]
    fn test_default_values() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.api_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_token_overrides_env_token() {
        let mut config = ClientConfig::default();
        config.api_token = Some("from-env".to_string());
        let config = config.with_token("from-flag");
        assert_eq!(config.api_token.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::for_base_url("not a url");
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.page_size = 0;
        assert!(config.validate().is_err());

        config = ClientConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
