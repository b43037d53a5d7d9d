// SPDX-License-Identifier: MIT

//! Onboarding submission endpoint.
//!
//! Accepts exactly three free-text answers from an authenticated caller and
//! persists them as a completed profile. The caller's identity is re-verified
//! server-side from the session cookie; client-supplied user ids are ignored.

use crate::error::{AppError, Result};
use crate::middleware::gate::credentials_from_jar;
use crate::models::{OnboardingSubmission, UserProfile};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/onboarding", post(submit_onboarding))
}

async fn submit_onboarding(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<OnboardingSubmission>,
) -> Result<Response> {
    let credentials = credentials_from_jar(&jar);
    let Some(access_token) = credentials.access_token else {
        return Err(AppError::Unauthorized);
    };

    let user = state
        .identity
        .get_user(&access_token)
        .await
        .map_err(|err| {
            // A provider failure here means we cannot prove who is calling;
            // reject rather than guess, and never write.
            tracing::warn!(error = %err, "Could not verify caller identity");
            AppError::Unauthorized
        })?
        .ok_or(AppError::Unauthorized)?;

    // Validate before any write is attempted.
    let answers = body.validated()?;

    tracing::debug!(user_id = %user.id, "Upserting onboarding answers");

    let profile = UserProfile::completed(user.id.clone(), answers);
    let written = state
        .profiles
        .upsert(&profile)
        .await?
        .ok_or(AppError::StoreNoRow)?;

    tracing::info!(user_id = %user.id, "Onboarding completed");

    let mut response = Json(serde_json::json!({
        "message": "Onboarding completed successfully",
        "data": written,
    }))
    .into_response();

    // The very next navigation re-reads the completion flag; make sure no
    // cache can serve a stale "not completed" state.
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    Ok(response)
}
