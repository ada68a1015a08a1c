use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use confab_entity::Room;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

pub mod attachments;
pub mod messages;
pub mod participants;
pub mod read_status;
pub mod transcript;

/// GET /api/rooms/{room_id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Room>, ApiError> {
    let room = state.message_operations.get_room(room_id, user.user_id).await?;
    Ok(Json(room))
}

/// DELETE /api/rooms/{room_id} — owner-only soft deactivation.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.message_operations.delete_room(room_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
