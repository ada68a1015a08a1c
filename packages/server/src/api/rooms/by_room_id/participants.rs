use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use confab_entity::Participant;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub email: String,
    pub name: String,
}

/// POST /api/rooms/{room_id}/participants
pub async fn post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    Json(request): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email must not be empty".to_string()));
    }

    let participant = state
        .message_operations
        .add_participant(room_id, user.user_id, request.user_id, request.email, request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// GET /api/rooms/{room_id}/participants
pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let participants =
        state.message_operations.list_participants(room_id, user.user_id).await?;
    Ok(Json(participants))
}

/// DELETE /api/rooms/{room_id}/participants/{participant_id}
pub async fn by_participant_id_delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((room_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .message_operations
        .remove_participant(room_id, participant_id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
