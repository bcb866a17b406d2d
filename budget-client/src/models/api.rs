use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;

/// Envelope the budget service wraps every successful payload in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
    pub success: bool,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    pub error_code: Option<String>,
    pub error_details: Option<serde_json::Value>,
}

/// Bearer token pair. Access and refresh tokens are only ever stored
/// and replaced together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub meta: AuthTokens,
}

#[derive(Debug, Serialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}
