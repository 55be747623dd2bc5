use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub user_id: Uuid,
    pub refresh_token: String,
    /// Seconds until the new refresh token expires
    pub refresh_expires_in: i64,
}

/// Logout body. Without a refresh token every session of the caller ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LogoutRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: Option<String>,
}
