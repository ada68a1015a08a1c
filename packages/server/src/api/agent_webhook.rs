use axum::{Json, extract::State};
use confab_surrealdb::repository::message_operations::TranscriptNotification;
use serde_json::{Value, json};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Transcript-ready callback from the meeting agent.
///
/// Deliveries may be retried; the operation is idempotent per
/// (room, session window), so a retry acks without appending a duplicate.
pub async fn post(
    State(state): State<AppState>,
    Json(payload): Json<TranscriptNotification>,
) -> Result<Json<Value>, ApiError> {
    if payload.event != "transcript_uploaded" {
        return Err(ApiError::BadRequest(format!("unsupported event type: {}", payload.event)));
    }

    let message = state.message_operations.ingest_transcript(payload).await?;

    info!(message_id = %message.message_id, room_id = %message.room_id, "transcript ingested");
    Ok(Json(json!({
        "status": "success",
        "message": "Transcript webhook processed",
        "message_id": message.message_id,
    })))
}
