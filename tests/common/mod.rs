// SPDX-License-Identifier: MIT

//! Shared test harness: in-memory doubles for the identity provider and the
//! profile store, plus router construction.

use async_trait::async_trait;
use dashmap::DashMap;
use onboard_portal::config::Config;
use onboard_portal::error::AppError;
use onboard_portal::models::{AuthUser, ResolvedSession, Session, SessionCredentials, UserProfile};
use onboard_portal::services::{DocsService, IdentityProvider, ProfileStore};
use onboard_portal::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory identity provider.
#[derive(Default)]
pub struct MockIdentity {
    /// Valid access tokens and the users behind them.
    pub users_by_token: DashMap<String, AuthUser>,
    /// Refresh tokens that resolution may redeem for a fresh session.
    pub refreshable: DashMap<String, Session>,
    /// OAuth codes redeemable for a session.
    pub exchangeable: DashMap<String, Session>,
    /// `email:password` pairs accepted for password sign-in.
    pub password_logins: DashMap<String, Session>,
    /// When set, sign-up reports pending email confirmation.
    pub confirm_required: AtomicBool,
    /// When set, every call fails (provider outage).
    pub failing: AtomicBool,
    /// Tokens that have been signed out.
    pub signed_out: DashMap<String, ()>,
}

impl MockIdentity {
    fn check_up(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AppError::Identity("provider down".to_string()))
        } else {
            Ok(())
        }
    }

    /// Mint a session and register its access token as valid.
    pub fn mint_session(&self, user_id: &str, email: Option<&str>) -> Session {
        let user = AuthUser {
            id: user_id.to_string(),
            email: email.map(str::to_string),
        };
        let session = Session {
            access_token: format!("token-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: None,
            user: user.clone(),
        };
        self.users_by_token
            .insert(session.access_token.clone(), user);
        session
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn resolve_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedSession>, AppError> {
        self.check_up()?;

        if let Some(access_token) = &credentials.access_token {
            if let Some(user) = self.users_by_token.get(access_token) {
                return Ok(Some(ResolvedSession {
                    session: Session {
                        access_token: access_token.clone(),
                        refresh_token: credentials.refresh_token.clone().unwrap_or_default(),
                        expires_at: None,
                        user: user.value().clone(),
                    },
                    refreshed: false,
                }));
            }
        }

        if let Some(refresh_token) = &credentials.refresh_token {
            if let Some(session) = self.refreshable.get(refresh_token) {
                return Ok(Some(ResolvedSession {
                    session: session.value().clone(),
                    refreshed: true,
                }));
            }
        }

        Ok(None)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        self.check_up()?;
        Ok(self
            .users_by_token
            .get(access_token)
            .map(|user| user.value().clone()))
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AppError> {
        self.check_up()?;
        self.exchangeable
            .get(code)
            .map(|session| session.value().clone())
            .ok_or_else(|| AppError::Identity("invalid authorization code".to_string()))
    }

    fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "https://auth.test/authorize?provider={}&redirect_to={}",
            provider,
            urlencoding::encode(redirect_to)
        )
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        self.check_up()?;
        self.password_logins
            .get(&format!("{email}:{password}"))
            .map(|session| session.value().clone())
            .ok_or_else(|| AppError::Identity("invalid credentials".to_string()))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _redirect_to: &str,
    ) -> Result<Option<Session>, AppError> {
        self.check_up()?;
        if self.confirm_required.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let user_id = format!("user-{email}");
        Ok(Some(self.mint_session(&user_id, Some(email))))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.check_up()?;
        self.users_by_token.remove(access_token);
        self.signed_out.insert(access_token.to_string(), ());
        Ok(())
    }
}

/// In-memory profile store.
#[derive(Default)]
pub struct MockProfiles {
    pub rows: DashMap<String, UserProfile>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// When set, upsert acknowledges but returns no row (policy denial).
    pub upsert_returns_no_row: AtomicBool,
    /// Number of writes that actually mutated the store.
    pub writes: AtomicUsize,
}

#[async_trait]
impl ProfileStore for MockProfiles {
    async fn get(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Store("read refused".to_string()));
        }
        Ok(self.rows.get(id).map(|row| row.value().clone()))
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<Option<UserProfile>, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Store("write refused".to_string()));
        }
        if self.upsert_returns_no_row.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(profile.id.clone(), profile.clone());
        Ok(Some(profile.clone()))
    }

    async fn insert(&self, profile: &UserProfile) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Store("write refused".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}

/// Handles to the doubles behind a test app.
pub struct TestContext {
    pub identity: Arc<MockIdentity>,
    pub profiles: Arc<MockProfiles>,
}

impl TestContext {
    /// Seed a signed-in user; `completed` of `None` means no profile row.
    #[allow(dead_code)]
    pub fn seed_user(&self, user_id: &str, email: &str, completed: Option<bool>) -> Session {
        let session = self.identity.mint_session(user_id, Some(email));
        if let Some(completed) = completed {
            let profile = if completed {
                UserProfile::completed(
                    user_id,
                    [
                        "answer one".to_string(),
                        "answer two".to_string(),
                        "answer three".to_string(),
                    ],
                )
            } else {
                UserProfile::initial(user_id)
            };
            self.profiles.rows.insert(user_id.to_string(), profile);
        }
        session
    }
}

/// Create a test app backed by in-memory doubles.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, TestContext) {
    let identity = Arc::new(MockIdentity::default());
    let profiles = Arc::new(MockProfiles::default());

    let state = Arc::new(AppState {
        config: Config::test_default(),
        identity: identity.clone(),
        profiles: profiles.clone(),
        docs: DocsService::from_markdown(
            "# Portal Documentation\n\n## Getting Started\n\nWelcome to the portal.\n",
        ),
    });

    (
        onboard_portal::routes::create_router(state),
        TestContext { identity, profiles },
    )
}
