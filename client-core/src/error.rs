use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        error_code: Option<String>,
        error_details: Option<serde_json::Value>,
    },

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Push channel error: {0}")]
    Channel(String),
}

impl ClientError {
    /// True when the caller should abandon the session and route the
    /// user back to sign-in instead of rendering an inline error.
    pub fn is_auth_fatal(&self) -> bool {
        match self {
            ClientError::SessionExpired(_) => true,
            ClientError::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
