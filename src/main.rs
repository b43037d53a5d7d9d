// SPDX-License-Identifier: MIT

//! Onboard-Portal server
//!
//! Serves the login, onboarding, dashboard, and documentation pages behind
//! the session gate, delegating identity and storage to external services.

use onboard_portal::{
    config::Config,
    services::{AuthApiClient, DocsService, RestProfileStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Onboard-Portal");

    // One outbound HTTP client shared by both provider clients
    let http = reqwest::Client::new();
    let identity = Arc::new(AuthApiClient::new(&config, http.clone()));
    let profiles = Arc::new(RestProfileStore::new(&config, http));

    // Render the documentation page once at startup
    let docs = match DocsService::load_from_file(&config.docs_path) {
        Ok(docs) => {
            tracing::info!(path = %config.docs_path, sections = docs.toc().len(), "Documentation loaded");
            docs
        }
        Err(err) => {
            tracing::warn!(error = %err, "Documentation file missing, serving placeholder");
            DocsService::from_markdown("# Documentation\n\nNo documentation is available yet.\n")
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        identity,
        profiles,
        docs,
    });

    // Build router
    let app = onboard_portal::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboard_portal=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
