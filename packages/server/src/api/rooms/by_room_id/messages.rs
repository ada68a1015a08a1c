use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use confab_entity::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rooms::ensure_caller;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub attachment_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// Walk backward from this sequence number (exclusive); omit for the
    /// newest page.
    pub before_seq: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessagePageResponse {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<i64>,
}

/// POST /api/rooms/{room_id}/messages
pub async fn post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let author_id = ensure_caller(&state, &user).await?;

    let message = state
        .message_operations
        .create_message(
            room_id,
            author_id,
            request.content,
            request.mentions,
            request.attachment_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/rooms/{room_id}/messages?before_seq=&limit=
pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<MessagePageResponse>, ApiError> {
    let page = state
        .message_operations
        .get_messages(room_id, user.user_id, params.before_seq, params.limit)
        .await?;
    Ok(Json(MessagePageResponse { messages: page.messages, has_more: page.has_more }))
}

/// GET /api/rooms/{room_id}/messages/search?q=&limit=
pub async fn search_get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest("q must not be empty".to_string()));
    }

    let messages = state
        .message_operations
        .search_messages(room_id, user.user_id, &params.q, params.limit)
        .await?;
    Ok(Json(messages))
}
