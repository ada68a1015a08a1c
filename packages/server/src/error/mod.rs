use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use confab_surrealdb::RepositoryError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API-surface errors. Every handler failure funnels through here so the
/// wire format stays uniform: `{"errcode": ..., "error": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    fn response_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "C_UNAUTHORIZED", self.to_string())
            },
            ApiError::Forbidden(reason) => {
                (StatusCode::FORBIDDEN, "C_FORBIDDEN", reason.clone())
            },
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, "C_NOT_FOUND", what.clone()),
            ApiError::Conflict(what) => (StatusCode::CONFLICT, "C_CONFLICT", what.clone()),
            ApiError::BadRequest(what) => {
                (StatusCode::BAD_REQUEST, "C_BAD_REQUEST", what.clone())
            },
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "C_INTERNAL",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            error!(error = %source, "request failed");
        }
        let (status, errcode, message) = self.response_parts();
        (status, Json(json!({ "errcode": errcode, "error": message }))).into_response()
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        match err {
            crate::storage::StorageError::NotFound(key) => {
                ApiError::NotFound(format!("object {key} not found"))
            },
            err @ crate::storage::StorageError::Backend(_) => ApiError::Internal(err.into()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            },
            RepositoryError::AccessDenied { reason } => ApiError::Forbidden(reason),
            RepositoryError::Unauthorized { .. } => ApiError::Unauthorized,
            RepositoryError::Conflict { message } => ApiError::Conflict(message),
            RepositoryError::DuplicateReaction { emoji } => {
                ApiError::Conflict(format!("already reacted with {emoji}"))
            },
            RepositoryError::Validation { field, message } => {
                ApiError::BadRequest(format!("{field}: {message}"))
            },
            err @ (RepositoryError::Database(_)
            | RepositoryError::Serialization(_)
            | RepositoryError::Storage(_)) => ApiError::Internal(err.into()),
        }
    }
}
