use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login and registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /whitelist`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhitelistRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

/// Registration form as entered, including the confirmation field.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    /// Check the confirmation locally, then hand back the payload to send.
    pub fn into_credentials(self) -> Result<Credentials, String> {
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        let credentials = Credentials::new(self.email, self.password);
        credentials.validate().map_err(|e| e.to_string())?;
        Ok(credentials)
    }
}
