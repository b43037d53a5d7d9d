// SPDX-License-Identifier: MIT

//! Onboard-Portal: gated onboarding web application
//!
//! This crate provides a small web app with email/OAuth sign-in (delegated to
//! an external identity provider), a three-question onboarding form, a
//! session-gating middleware enforcing the access policy, and a markdown
//! documentation viewer.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{DocsService, IdentityProvider, ProfileStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub docs: DocsService,
}
