use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file, durably stored before any message references it.
///
/// Lifecycle: created with `message_id = None` (an orphan) at upload time,
/// later bound to exactly one message. Rebinding to a different message is
/// rejected by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment identity
    pub attachment_id: Uuid,

    /// Owning message; None while the upload is an orphan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,

    /// Room the file was uploaded into
    pub room_id: Uuid,

    pub file_name: String,

    pub file_type: String,

    pub file_size: i64,

    /// Object-storage key the bytes live under
    pub storage_key: String,

    /// Public/derived URL for clients
    pub storage_url: String,

    pub created_at: DateTime<Utc>,
}
