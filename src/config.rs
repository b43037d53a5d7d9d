//! Application configuration loaded from environment variables.
//!
//! All provider credentials come in through the environment; nothing is
//! fetched lazily at request time.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the identity provider / data API (Supabase-style project URL).
    pub auth_base_url: String,
    /// Public (anon) API key sent as the `apikey` header on auth calls.
    pub auth_api_key: String,
    /// Server-side key used for profile store reads/writes.
    pub service_role_key: String,
    /// Externally visible origin, used when no forwarding headers are present.
    pub public_base_url: String,
    /// Server port
    pub port: u16,
    /// Markdown file rendered on the documentation page.
    pub docs_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_api_key =
            env::var("AUTH_API_KEY").map_err(|_| ConfigError::Missing("AUTH_API_KEY"))?;

        Ok(Self {
            auth_base_url: env::var("AUTH_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("AUTH_BASE_URL"))?,
            // The service role key falls back to the anon key for local dev
            // setups without row-level security.
            service_role_key: env::var("AUTH_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| auth_api_key.clone()),
            auth_api_key,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            docs_path: env::var("DOCS_PATH")
                .unwrap_or_else(|_| "docs/DOCUMENTATION.md".to_string()),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            auth_base_url: "http://localhost:54321".to_string(),
            auth_api_key: "test_anon_key".to_string(),
            service_role_key: "test_service_key".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            port: 8080,
            docs_path: "docs/DOCUMENTATION.md".to_string(),
        }
    }

    /// Whether session cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
