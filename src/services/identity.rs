// SPDX-License-Identifier: MIT

//! Identity provider client.
//!
//! Sessions, OAuth code exchange, and password handling are owned entirely by
//! an external GoTrue-style auth service; this module is the HTTP glue plus
//! the capability trait the rest of the app depends on. Handlers and the
//! gating middleware only ever see `dyn IdentityProvider`, so tests can swap
//! in an in-memory double without network calls.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AuthUser, ResolvedSession, Session, SessionCredentials};
use async_trait::async_trait;
use serde::Deserialize;

/// Capability interface over the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve request credentials into a session, refreshing expired tokens
    /// when possible. `Ok(None)` means anonymous.
    async fn resolve_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedSession>, AppError>;

    /// Look up the user behind an access token. `Ok(None)` means the token is
    /// invalid or expired.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError>;

    /// Exchange an OAuth authorization code for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AppError>;

    /// Build the provider's authorize URL for an OAuth sign-in.
    fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> String;

    /// Email/password sign-in.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError>;

    /// Create an account. Returns `None` when the provider requires email
    /// confirmation before issuing a session.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<Option<Session>, AppError>;

    /// Invalidate the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// HTTP client for a GoTrue-style auth API (`/auth/v1/...`).
#[derive(Clone)]
pub struct AuthApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Token grant response (`/token` and `/signup` endpoints).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    user: AuthUser,
}

/// `/signup` may return a bare user instead of a session when email
/// confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(TokenResponse),
    Pending { id: String },
}

impl AuthApiClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: format!("{}/auth/v1", config.auth_base_url),
            api_key: config.auth_api_key.clone(),
        }
    }

    fn session_from(&self, token: TokenResponse) -> Session {
        let expires_at = token
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + secs);
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, AppError> {
        let url = format!("{}/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        let token: TokenResponse = check_response_json(response).await?;
        Ok(self.session_from(token))
    }
}

/// Read the provider's error payload (`error_description` or `msg`) out of a
/// failed response, falling back to the raw body.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    #[derive(Deserialize)]
    struct ProviderError {
        error_description: Option<String>,
        msg: Option<String>,
    }

    let detail = serde_json::from_str::<ProviderError>(&body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg))
        .unwrap_or(body);

    format!("{}: {}", status, detail)
}

async fn check_response_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        return Err(AppError::Identity(error_message(response).await));
    }
    response
        .json()
        .await
        .map_err(|e| AppError::Identity(format!("Invalid response body: {}", e)))
}

#[async_trait]
impl IdentityProvider for AuthApiClient {
    async fn resolve_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedSession>, AppError> {
        if credentials.is_empty() {
            return Ok(None);
        }

        // The access token is opaque to us; validity is the provider's call.
        if let Some(access_token) = &credentials.access_token {
            if let Some(user) = self.get_user(access_token).await? {
                return Ok(Some(ResolvedSession {
                    session: Session {
                        access_token: access_token.clone(),
                        refresh_token: credentials.refresh_token.clone().unwrap_or_default(),
                        expires_at: None,
                        user,
                    },
                    refreshed: false,
                }));
            }
        }

        // Access token rejected or absent; try the refresh grant.
        let Some(refresh_token) = &credentials.refresh_token else {
            return Ok(None);
        };

        match self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await
        {
            Ok(session) => Ok(Some(ResolvedSession {
                session,
                refreshed: true,
            })),
            Err(err) => {
                // A rejected refresh token is a normal logged-out state, not
                // an error worth surfacing.
                tracing::debug!(error = %err, "Refresh grant rejected");
                Ok(None)
            }
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        let url = format!("{}/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }

        let user: AuthUser = check_response_json(response).await?;
        Ok(Some(user))
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AppError> {
        self.token_grant(
            "authorization_code",
            serde_json::json!({ "auth_code": code }),
        )
        .await
    }

    fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/authorize?provider={}&redirect_to={}",
            self.base_url,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to)
        )
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<Option<Session>, AppError> {
        let url = format!("{}/signup", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "options": { "email_redirect_to": redirect_to },
            }))
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        match check_response_json(response).await? {
            SignupResponse::Session(token) => Ok(Some(self.session_from(token))),
            SignupResponse::Pending { id } => {
                tracing::info!(user_id = %id, "Signup pending email confirmation");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/logout", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Identity(error_message(response).await));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AuthApiClient {
        AuthApiClient::new(&Config::test_default(), reqwest::Client::new())
    }

    #[test]
    fn test_oauth_authorize_url() {
        let url = test_client().sign_in_with_oauth("github", "http://localhost:8080/auth/callback");
        assert_eq!(
            url,
            "http://localhost:54321/auth/v1/authorize?provider=github&\
             redirect_to=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"
        );
    }

    #[tokio::test]
    async fn test_resolve_session_without_credentials_is_anonymous() {
        let resolved = test_client()
            .resolve_session(&SessionCredentials::default())
            .await
            .expect("no network call for empty credentials");
        assert!(resolved.is_none());
    }
}
