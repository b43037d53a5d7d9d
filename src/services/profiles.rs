// SPDX-License-Identifier: MIT

//! Profile store client.
//!
//! One `user_profiles` row per user, served by a PostgREST-style table
//! endpoint (`/rest/v1/user_profiles`). The store is the only writer surface;
//! the gate middleware and the home page are read-only consumers.

use crate::config::Config;
use crate::error::AppError;
use crate::models::UserProfile;
use async_trait::async_trait;

/// Capability interface over the external profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by user id. `Ok(None)` means no row exists.
    async fn get(&self, id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Insert-or-overwrite by primary key, returning the written row.
    ///
    /// `Ok(None)` models the store acknowledging the write but returning no
    /// row (a policy denial, distinct from a write error).
    async fn upsert(&self, profile: &UserProfile) -> Result<Option<UserProfile>, AppError>;

    /// Plain insert, used for the initial row right after signup.
    async fn insert(&self, profile: &UserProfile) -> Result<(), AppError>;
}

/// PostgREST-backed profile store.
#[derive(Clone)]
pub struct RestProfileStore {
    http: reqwest::Client,
    table_url: String,
    api_key: String,
}

impl RestProfileStore {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            table_url: format!("{}/rest/v1/user_profiles", config.auth_base_url),
            api_key: config.service_role_key.clone(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn store_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::Store(format!("{}: {}", status, body))
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn get(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        let response = self
            .request(self.http.get(&self.table_url))
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }

        let mut rows: Vec<UserProfile> = response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Invalid response body: {}", e)))?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<Option<UserProfile>, AppError> {
        let response = self
            .request(self.http.post(&self.table_url))
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            )
            .json(&[profile])
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }

        let rows: Vec<UserProfile> = response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Invalid response body: {}", e)))?;

        Ok(rows.into_iter().next())
    }

    async fn insert(&self, profile: &UserProfile) -> Result<(), AppError> {
        let response = self
            .request(self.http.post(&self.table_url))
            .header("Prefer", "return=minimal")
            .json(&[profile])
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }
        Ok(())
    }
}
