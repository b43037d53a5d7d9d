// SPDX-License-Identifier: MIT

//! Session-gating middleware.
//!
//! Every page request is classified against the access policy before any
//! handler runs: anonymous users land on the login page, authenticated users
//! with an incomplete profile land on the onboarding page, completed users
//! are kept out of login/onboarding. The decision itself is a pure function
//! of (auth state, path class); all I/O happens before it.
//!
//! Failure posture: an identity provider error degrades to anonymous, a
//! profile lookup error or missing row degrades to "not onboarded". The gate
//! never surfaces an error to the browser.

use crate::models::{Session, SessionCredentials};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/login";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const HOME_PATH: &str = "/";

/// Session cookie names. The access token cookie is what the identity
/// provider validates; the refresh cookie lets resolution mint new tokens.
pub const SESSION_COOKIE: &str = "portal_token";
pub const REFRESH_COOKIE: &str = "portal_refresh";

// Paths the gate never inspects. Static assets and the service's own
// auth/API endpoints (the OAuth callback must be reachable anonymously, and
// the onboarding API answers 401/400 itself).
const EXCLUDED_PATHS: &[&str] = &["/health", "/favicon.ico"];
const EXCLUDED_PREFIXES: &[&str] = &["/static/", "/auth/", "/api/"];
const EXCLUDED_SUFFIXES: &[&str] = &[
    ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".css", ".js", ".ico", ".woff2",
];

/// Whether a path bypasses the gate entirely.
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PATHS.contains(&path)
        || EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p))
        || EXCLUDED_SUFFIXES.iter().any(|s| path.ends_with(s))
}

/// Three-way path classification the policy operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Login,
    Onboarding,
    Other,
}

pub fn classify(path: &str) -> PathClass {
    match path {
        LOGIN_PATH => PathClass::Login,
        ONBOARDING_PATH => PathClass::Onboarding,
        _ => PathClass::Other,
    }
}

/// Per-request auth state, recomputed from the providers on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    /// Valid session, onboarding not completed (or unknown).
    Incomplete,
    /// Valid session, onboarding completed.
    Complete,
}

/// Outcome of the policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    ToLogin,
    ToOnboarding,
    ToHome,
}

/// The access policy. Pure; evaluated fresh on every request.
pub fn decide(state: AuthState, path: PathClass) -> GateDecision {
    use AuthState::*;
    use GateDecision::*;
    use PathClass::*;

    match (state, path) {
        (Anonymous, Login) => Pass,
        (Anonymous, _) => ToLogin,
        (Incomplete, Login) => ToOnboarding,
        (Incomplete, Onboarding) => Pass,
        (Incomplete, Other) => ToOnboarding,
        (Complete, Login) => ToHome,
        (Complete, Onboarding) => ToHome,
        (Complete, Other) => Pass,
    }
}

/// Resolved user attached to pass-through requests for downstream handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
    pub onboarding_completed: bool,
}

/// The middleware itself: resolve session, read completion flag, apply the
/// policy, and carry any refreshed cookies out on this same response.
pub async fn session_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_excluded(&path) {
        return next.run(request).await;
    }

    let credentials = credentials_from_jar(&jar);
    let resolved = match state.identity.resolve_session(&credentials).await {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(error = %err, "Session resolution failed, treating as anonymous");
            None
        }
    };

    let mut refreshed_session = None;
    let auth_state = match &resolved {
        None => AuthState::Anonymous,
        Some(resolved) => {
            if resolved.refreshed {
                refreshed_session = Some(resolved.session.clone());
            }
            let completed = match state.profiles.get(&resolved.session.user.id).await {
                Ok(Some(profile)) => profile.onboarding_completed,
                Ok(None) => false,
                Err(err) => {
                    // Fail safe toward onboarding, never toward the home page.
                    tracing::warn!(
                        error = %err,
                        user_id = %resolved.session.user.id,
                        "Profile lookup failed, treating as not onboarded"
                    );
                    false
                }
            };
            if completed {
                AuthState::Complete
            } else {
                AuthState::Incomplete
            }
        }
    };

    let mut response = match decide(auth_state, classify(&path)) {
        GateDecision::Pass => {
            if let Some(resolved) = &resolved {
                request.extensions_mut().insert(CurrentUser {
                    id: resolved.session.user.id.clone(),
                    email: resolved.session.user.email.clone(),
                    onboarding_completed: auth_state == AuthState::Complete,
                });
            }
            next.run(request).await
        }
        GateDecision::ToLogin => found_redirect(LOGIN_PATH),
        GateDecision::ToOnboarding => found_redirect(ONBOARDING_PATH),
        GateDecision::ToHome => found_redirect(HOME_PATH),
    };

    if let Some(session) = refreshed_session {
        attach_cookies(
            &mut response,
            &session_cookies(&session, state.config.secure_cookies()),
        );
    }

    response
}

/// A 302 redirect; the policy deliberately uses Found rather than 307/308 so
/// browsers re-issue a GET at the target.
pub fn found_redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Read session credentials out of the request cookies.
pub fn credentials_from_jar(jar: &CookieJar) -> SessionCredentials {
    SessionCredentials {
        access_token: jar.get(SESSION_COOKIE).map(|c| c.value().to_string()),
        refresh_token: jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()),
    }
}

/// Cookies carrying a session to the browser.
pub fn session_cookies(session: &Session, secure: bool) -> [Cookie<'static>; 2] {
    let access = Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(30))
        .build();
    let refresh = Cookie::build((REFRESH_COOKIE, session.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(30))
        .build();
    [access, refresh]
}

/// Expired cookies used on logout. Attributes must match the creation
/// attributes or browsers will not remove them.
pub fn removal_cookies(secure: bool) -> [Cookie<'static>; 2] {
    let expire = |name: &'static str| {
        Cookie::build((name, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(time::Duration::ZERO)
            .build()
    };
    [expire(SESSION_COOKIE), expire(REFRESH_COOKIE)]
}

/// Append Set-Cookie headers to an already-built response.
pub fn attach_cookies(response: &mut Response, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => {
                tracing::error!(error = %err, cookie = %cookie.name(), "Unencodable cookie value");
            }
        }
    }
}
