use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::editor::EditorError;
use crate::profile_client::ProfileError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Profile service error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Editor(e) => match e {
                EditorError::BlockNotFound(_) | EditorError::EntryNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
                }
                EditorError::InvalidBlockType(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_BLOCK_TYPE", e.to_string())
                }
                _ => (StatusCode::BAD_REQUEST, "INVALID_EDIT", e.to_string()),
            },
            AppError::Profile(e) => {
                tracing::error!("Profile service error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROFILE_SERVICE_ERROR",
                    "The profile service could not be reached".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
