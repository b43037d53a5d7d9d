// SPDX-License-Identifier: MIT

//! Data models shared between routes, middleware, and the provider clients.

pub mod profile;
pub mod session;

pub use profile::{OnboardingSubmission, UserProfile};
pub use session::{AuthUser, ResolvedSession, Session, SessionCredentials};
