use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use confab_entity::Attachment;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Upload size ceiling, matching the validation advertised to clients.
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// POST /api/rooms/{room_id}/attachments (multipart, field name "file")
///
/// Two-phase: the file lands in object storage and gets an orphan attachment
/// row here; a later message creation binds it. The upload is durable even
/// if no message ever references it.
pub async fn post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(room_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file field needs a filename".to_string()))?;
        let file_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {e}")))?;

        upload = Some((file_name, file_type, data));
        break;
    }

    let (file_name, file_type, data) =
        upload.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("file must not be empty".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(ApiError::BadRequest(format!(
            "file exceeds the {} byte limit",
            MAX_FILE_SIZE
        )));
    }

    let attachment_id = Uuid::new_v4();
    let storage_key = format!("{room_id}/{attachment_id}/{file_name}");
    let file_size = data.len() as i64;

    // Storage first: the database row must never point at bytes that are
    // not durable yet.
    let storage_url = state.storage.put(&storage_key, data, &file_type).await?;

    let attachment = Attachment {
        attachment_id,
        message_id: None,
        room_id,
        file_name,
        file_type,
        file_size,
        storage_key,
        storage_url,
        created_at: Utc::now(),
    };

    let created = state
        .message_operations
        .register_attachment(room_id, user.user_id, attachment)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
