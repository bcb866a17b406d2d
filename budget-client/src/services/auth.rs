//! Sign-in, sign-out and session access.

use std::sync::Arc;

use validator::Validate;

use client_core::error::ClientError;

use crate::http::ApiClient;
use crate::models::api::{LoginResponse, SignInRequest};
use crate::models::user::User;
use crate::push::PushChannel;
use crate::session::{Session, SessionStore};

pub struct AuthService {
    api: Arc<ApiClient>,
    push: Arc<dyn PushChannel>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, push: Arc<dyn PushChannel>) -> Self {
        Self { api, push }
    }

    fn session_store(&self) -> &SessionStore {
        self.api.session()
    }

    /// Authenticates against the budget service, persists the session
    /// and connects the push channel.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let response: LoginResponse = self.api.post("/auth/login", &request).await?;

        let session = self.session_store();
        session.set_tokens(response.meta.clone())?;
        session.set_user(response.user.clone())?;

        if let Err(err) = self.push.connect(&response.meta.access_token).await {
            tracing::warn!(error = %err, "push channel connect failed after sign-in");
        }

        tracing::info!(
            user_id = %response.user.id,
            email = %response.user.email,
            "user signed in"
        );

        Ok(response.user)
    }

    /// Disconnects the push channel, revokes the session server-side
    /// (best effort) and clears local state regardless.
    pub async fn sign_out(&self) {
        self.push.disconnect().await;

        if let Err(err) = self.api.post_empty("/auth/signout").await {
            tracing::warn!(error = %err, "signout request failed");
        }

        self.session_store().clear();
        tracing::info!("user signed out");
    }

    pub fn get_session(&self) -> Option<Session> {
        self.session_store().session()
    }

    /// Reconnects the push channel for a session restored from the
    /// persistent store. Returns whether a session was present.
    pub async fn resume(&self) -> Result<bool, ClientError> {
        match self.session_store().tokens() {
            Some(tokens) => {
                self.push.connect(&tokens.access_token).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
