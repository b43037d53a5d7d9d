// SPDX-License-Identifier: MIT

//! External collaborators (identity provider, profile store) and the
//! documentation renderer.

pub mod docs;
pub mod identity;
pub mod profiles;

pub use docs::DocsService;
pub use identity::{AuthApiClient, IdentityProvider};
pub use profiles::{ProfileStore, RestProfileStore};
