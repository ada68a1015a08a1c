use axum::{Json, extract::State, http::StatusCode};
use confab_entity::{Room, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

pub mod by_room_id;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/rooms
pub async fn post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    if request.room_name.trim().is_empty() {
        return Err(ApiError::BadRequest("room_name must not be empty".to_string()));
    }

    ensure_user_record(&state, &user).await?;

    let room = state
        .message_operations
        .create_room(request.room_name, request.description, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /api/rooms
pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Room>>, ApiError> {
    let rooms = state.message_operations.list_rooms(user.user_id).await?;
    Ok(Json(rooms))
}

/// Accounts live in the external auth service; mirror the caller into the
/// local user table on first write so author names can be hydrated.
async fn ensure_user_record(state: &AppState, user: &AuthenticatedUser) -> Result<(), ApiError> {
    if state.user_repository.get_by_id(user.user_id).await?.is_some() {
        return Ok(());
    }

    let name = user
        .name
        .clone()
        .ok_or_else(|| ApiError::BadRequest("token is missing the name claim".to_string()))?;
    let email = user
        .email
        .clone()
        .ok_or_else(|| ApiError::BadRequest("token is missing the email claim".to_string()))?;

    let record =
        User { user_id: user.user_id, name, email, created_at: chrono::Utc::now() };
    state.user_repository.create(&record).await?;
    Ok(())
}

/// Shared by handlers that need the caller mirrored before acting.
pub(crate) async fn ensure_caller(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Uuid, ApiError> {
    ensure_user_record(state, user).await?;
    Ok(user.user_id)
}
