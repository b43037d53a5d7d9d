// SPDX-License-Identifier: MIT

//! Authentication routes.
//!
//! All credential handling is delegated to the identity provider; these
//! handlers translate between browser requests, provider calls, and session
//! cookies. Everything under `/auth/` bypasses the session gate.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::gate::{
    attach_cookies, credentials_from_jar, found_redirect, removal_cookies, session_cookies,
    HOME_PATH, LOGIN_PATH,
};
use crate::models::UserProfile;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/callback", get(auth_callback))
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/oauth/{provider}", get(oauth_start))
        .route("/auth/logout", post(logout))
}

/// Externally visible origin for this request.
///
/// Behind a reverse proxy the Host header is the internal hop, so the
/// forwarded headers win when both are present.
fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    let forwarded_host = headers
        .get("x-forwarded-host")
        .and_then(|h| h.to_str().ok());
    let forwarded_proto = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok());

    if let (Some(host), Some(proto)) = (forwarded_host, forwarded_proto) {
        return format!("{}://{}", proto, host);
    }

    match headers.get(axum::http::header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => {
            let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
                "http"
            } else {
                "https"
            };
            format!("{}://{}", scheme, host)
        }
        None => fallback.trim_end_matches('/').to_string(),
    }
}

fn login_error_redirect(message: &str) -> Response {
    found_redirect(&format!(
        "{}?error={}",
        LOGIN_PATH,
        urlencoding::encode(message)
    ))
}

#[derive(Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code for a session and land on home.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let origin = request_origin(&headers, &state.config.public_base_url);

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        return found_redirect(&format!(
            "{}/login?error={}",
            origin,
            urlencoding::encode(&error)
        ));
    }

    let Some(code) = params.code else {
        // Nothing to exchange; the gate sorts the visitor out at `/`.
        return found_redirect(&format!("{}/", origin));
    };

    match state.identity.exchange_code_for_session(&code).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "OAuth code exchanged");
            let mut response = found_redirect(&format!("{}/", origin));
            attach_cookies(
                &mut response,
                &session_cookies(&session, state.config.secure_cookies()),
            );
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "OAuth code exchange failed");
            found_redirect(&format!(
                "{}/login?error={}",
                origin,
                urlencoding::encode(&err.to_string())
            ))
        }
    }
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Email/password sign-in.
async fn login(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Response {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return login_error_redirect("Please enter both email and password");
    }

    match state
        .identity
        .sign_in_with_password(&credentials.email, &credentials.password)
        .await
    {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "Password sign-in");
            let mut response = found_redirect(HOME_PATH);
            attach_cookies(
                &mut response,
                &session_cookies(&session, state.config.secure_cookies()),
            );
            response
        }
        Err(err) => {
            tracing::warn!(error = %err, "Password sign-in failed");
            login_error_redirect("Invalid email or password")
        }
    }
}

/// Email/password account creation.
///
/// When the provider issues a session immediately, the initial profile row is
/// inserted with `onboarding_completed = false`. The insert is best effort:
/// the onboarding upsert repairs a missed row.
async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Response {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return login_error_redirect("Please enter both email and password");
    }
    if credentials.password.len() < 6 {
        return login_error_redirect("Password must be at least 6 characters");
    }

    let origin = request_origin(&headers, &state.config.public_base_url);
    let redirect_to = format!("{}/auth/callback", origin);

    match state
        .identity
        .sign_up(&credentials.email, &credentials.password, &redirect_to)
        .await
    {
        Ok(Some(session)) => {
            if let Err(err) = state
                .profiles
                .insert(&UserProfile::initial(session.user.id.clone()))
                .await
            {
                tracing::warn!(
                    error = %err,
                    user_id = %session.user.id,
                    "Initial profile insert failed; onboarding upsert will create it"
                );
            }

            tracing::info!(user_id = %session.user.id, "Account created");
            let mut response = found_redirect(HOME_PATH);
            attach_cookies(
                &mut response,
                &session_cookies(&session, state.config.secure_cookies()),
            );
            response
        }
        Ok(None) => found_redirect(&format!("{}?notice=confirm", LOGIN_PATH)),
        Err(err) => {
            tracing::warn!(error = %err, "Signup failed");
            login_error_redirect("Could not create account")
        }
    }
}

/// Start an OAuth flow - redirect to the provider's authorize URL.
async fn oauth_start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Response {
    let origin = request_origin(&headers, &state.config.public_base_url);
    let redirect_to = format!("{}/auth/callback", origin);

    let authorize_url = state.identity.sign_in_with_oauth(&provider, &redirect_to);

    tracing::info!(provider = %provider, "Starting OAuth flow");
    found_redirect(&authorize_url)
}

/// Sign out: invalidate the session at the provider and expire the cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(access_token) = credentials_from_jar(&jar).access_token {
        if let Err(err) = state.identity.sign_out(&access_token).await {
            // Cookies are cleared regardless; the provider-side session will
            // expire on its own.
            tracing::warn!(error = %err, "Provider sign-out failed");
        }
    }

    let mut response = found_redirect(LOGIN_PATH);
    attach_cookies(
        &mut response,
        &removal_cookies(state.config.secure_cookies()),
    );
    response
}
