use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use confab_entity::Message;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

/// PUT /api/messages/{message_id} — author-only edit; the message keeps its
/// position in the log.
pub async fn put(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .message_operations
        .edit_message(message_id, user.user_id, request.content)
        .await?;
    Ok(Json(message))
}

/// DELETE /api/messages/{message_id} — author-only soft delete.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.message_operations.delete_message(message_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/messages/{message_id}/reactions
pub async fn reactions_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<ReactionRequest>,
) -> Result<Json<Message>, ApiError> {
    if request.emoji.trim().is_empty() {
        return Err(ApiError::BadRequest("emoji must not be empty".to_string()));
    }

    let message = state
        .message_operations
        .add_reaction(message_id, user.user_id, request.emoji)
        .await?;
    Ok(Json(message))
}
