// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No valid session for a request that requires one.
    #[error("Unauthorized")]
    Unauthorized,

    /// Required input missing or empty.
    #[error("{0}")]
    Validation(String),

    /// The identity provider call failed outside the gating middleware
    /// (inside the middleware a failure degrades to "anonymous" instead).
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// Profile store read/write failed.
    #[error("Profile store error: {0}")]
    Store(String),

    /// The store reported success but returned no row (policy denial).
    #[error("Profile store returned no row")]
    StoreNoRow,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Identity(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "Identity provider unavailable".to_string(),
                    None,
                )
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Profile store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save onboarding data".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::StoreNoRow => {
                tracing::error!("Profile store returned no row from upsert");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save onboarding data - no data returned".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse { error, details };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
