use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use confab_entity::MessageType;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/rooms/{room_id}/transcript/{message_id}/{*key}
///
/// Streams a transcript object, but only through the message that owns it:
/// the key must exactly match one of the message's stored transcript keys.
/// Anything else is NotFound, so the endpoint cannot be used to walk the
/// bucket.
pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((room_id, message_id, key)): Path<(Uuid, Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.message_operations.get_message(message_id, user.user_id).await?;

    if message.room_id != room_id || message.message_type != MessageType::MeetingTranscript {
        return Err(ApiError::NotFound(format!("transcript message {message_id} not found")));
    }

    let transcript = message
        .extra_data
        .as_ref()
        .and_then(|e| e.transcript.as_ref())
        .ok_or_else(|| ApiError::NotFound(format!("transcript message {message_id} not found")))?;

    let content_type = if key == transcript.keys.json {
        "application/json"
    } else if key == transcript.keys.text {
        "text/plain; charset=utf-8"
    } else {
        return Err(ApiError::NotFound(format!("transcript object {key} not found")));
    };

    let data = state.storage.get(&key).await?;
    Ok(([(CONTENT_TYPE, content_type)], data))
}
