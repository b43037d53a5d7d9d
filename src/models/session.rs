// SPDX-License-Identifier: MIT

//! Session types as issued by the external identity provider.
//!
//! The application never constructs or mutates a session on its own; it only
//! reads whatever the provider hands back during per-request resolution.

use serde::{Deserialize, Serialize};

/// The authenticated user embedded in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user identifier assigned by the identity provider.
    pub id: String,
    /// Email address (may be absent for some OAuth providers).
    pub email: Option<String>,
}

/// A session issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp after which the access token is no longer valid.
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Request-scoped credentials read from cookies.
///
/// Passed explicitly into session resolution so the gating logic stays a
/// function of its inputs rather than of ambient request state.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionCredentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Outcome of resolving request credentials against the identity provider.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: Session,
    /// True when resolution minted fresh tokens; the response for the same
    /// request must carry the updated cookies.
    pub refreshed: bool,
}
