//! Authenticated HTTP client for the budget service.
//!
//! Attaches the current access token to every outbound request. On the
//! first 401 a request observes, the stored refresh token is exchanged
//! for a new pair and the request is dispatched once more; a failing
//! refresh clears the session. A request is never retried twice.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use client_core::error::ClientError;

use crate::config::ApiSettings;
use crate::models::api::{ApiEnvelope, ApiErrorBody, AuthTokens, RefreshRequest};
use crate::session::SessionStore;

/// Everything needed to dispatch a call again after a token refresh,
/// plus the one-shot marker that bounds the retry.
struct RequestSpec {
    method: Method,
    path: String,
    query: Option<Value>,
    body: Option<Value>,
    retried: bool,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: SessionStore) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize,
    {
        let query = serde_json::to_value(query)?;
        self.request(Method::GET, path, Some(query), None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<(), ClientError> {
        self.request_unit(Method::POST, path, None, None).await
    }

    pub async fn patch_empty(&self, path: &str) -> Result<(), ClientError> {
        self.request_unit(Method::PATCH, path, None, None).await
    }

    pub async fn delete_empty(&self, path: &str) -> Result<(), ClientError> {
        self.request_unit(Method::DELETE, path, None, None).await
    }

    /// Generic authenticated request; unwraps the response envelope.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<Value>,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let spec = RequestSpec {
            method,
            path: path.to_string(),
            query,
            body,
            retried: false,
        };
        let response = self.send_checked(spec).await?;
        let raw = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&raw)?;
        Ok(envelope.data)
    }

    /// Generic authenticated request for endpoints whose payload the
    /// caller does not care about.
    pub async fn request_unit(
        &self,
        method: Method,
        path: &str,
        query: Option<Value>,
        body: Option<Value>,
    ) -> Result<(), ClientError> {
        let spec = RequestSpec {
            method,
            path: path.to_string(),
            query,
            body,
            retried: false,
        };
        self.send_checked(spec).await?;
        Ok(())
    }

    /// Drives a request through the refresh state machine.
    ///
    /// A 401 on a request that carried a token triggers one refresh
    /// and one re-dispatch; the marker on the descriptor guarantees no
    /// request loops, no matter how many 401s follow.
    async fn send_checked(&self, mut spec: RequestSpec) -> Result<reqwest::Response, ClientError> {
        loop {
            let authenticated = self.session.tokens().is_some();
            let response = self.dispatch(&spec).await?;

            if response.status() != StatusCode::UNAUTHORIZED || spec.retried || !authenticated {
                return self.check_status(response).await;
            }

            spec.retried = true;
            self.refresh_session().await?;
            tracing::debug!(path = %spec.path, "retrying request with refreshed token");
        }
    }

    async fn dispatch(&self, spec: &RequestSpec) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, spec.path);
        let mut builder = self.http.request(spec.method.clone(), &url);
        if let Some(query) = &spec.query {
            builder = builder.query(query);
        }
        if let Some(body) = &spec.body {
            builder = builder.json(body);
        }
        if let Some(tokens) = self.session.tokens() {
            builder = builder.bearer_auth(&tokens.access_token);
        }

        builder.send().await.map_err(|err| {
            tracing::error!(method = %spec.method, url = %url, error = %err, "request failed to send");
            ClientError::from(err)
        })
    }

    /// Exchanges the stored refresh token for a new pair.
    ///
    /// Goes through a bare call rather than `send_checked`, so a
    /// failing refresh can never recurse into another refresh. Any
    /// failure clears the session and surfaces as `SessionExpired`.
    async fn refresh_session(&self) -> Result<(), ClientError> {
        let Some(tokens) = self.session.tokens() else {
            self.session.clear();
            return Err(ClientError::SessionExpired(
                "no refresh token available".to_string(),
            ));
        };

        let url = format!("{}/auth/refresh", self.base_url);
        let result = self
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh_token: tokens.refresh_token,
            })
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                let status = response.status();
                self.session.clear();
                tracing::warn!(status = %status, "token refresh rejected, session cleared");
                return Err(ClientError::SessionExpired(format!(
                    "token refresh rejected with status {}",
                    status
                )));
            }
            Err(err) => {
                self.session.clear();
                tracing::warn!(error = %err, "token refresh failed, session cleared");
                return Err(ClientError::SessionExpired(format!(
                    "token refresh failed: {}",
                    err
                )));
            }
        };

        let fresh: AuthTokens = match response.json().await {
            Ok(fresh) => fresh,
            Err(err) => {
                self.session.clear();
                return Err(ClientError::SessionExpired(format!(
                    "malformed token refresh response: {}",
                    err
                )));
            }
        };

        if let Err(err) = self.session.set_tokens(fresh) {
            tracing::warn!(error = %err, "failed to persist refreshed tokens");
        }
        tracing::info!("access token refreshed");
        Ok(())
    }

    /// Maps non-2xx responses to `ClientError::Api`, preserving the
    /// server-provided payload.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ApiErrorBody>(&raw).ok();
        let (message, error_code, error_details) = match body {
            Some(body) if !body.message.is_empty() => {
                (body.message, body.error_code, body.error_details)
            }
            _ => (
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                None,
                None,
            ),
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
            error_code,
            error_details,
        })
    }
}
