use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub seq_no: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadStatusResponse {
    pub last_read_seq_no: i64,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// POST /api/rooms/{room_id}/read
///
/// The cursor never moves backwards; a stale seq_no acks with the current
/// position.
pub async fn post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<ReadStatusResponse>, ApiError> {
    if request.seq_no < 0 {
        return Err(ApiError::BadRequest("seq_no must not be negative".to_string()));
    }

    let participant = state
        .message_operations
        .mark_read(room_id, user.user_id, request.seq_no)
        .await?;
    Ok(Json(ReadStatusResponse {
        last_read_seq_no: participant.last_read_seq_no,
        last_viewed_at: participant.last_viewed_at,
    }))
}

/// GET /api/rooms/{room_id}/unread
pub async fn unread_get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread_count = state.message_operations.unread_count(room_id, user.user_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}
