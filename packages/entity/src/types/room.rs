use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded conversation/meeting context owning messages and participants.
///
/// `last_message_seq` is the room's monotonic sequence counter. It is mutated
/// only inside message insertion, in the same transaction as the insert, so
/// committed messages form a gapless range starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Room identity
    pub room_id: Uuid,

    /// Human-facing unique room name (webhook payloads address rooms by name)
    pub room_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owning user
    pub owner_id: Uuid,

    /// Sequence number of the most recently committed message; 0 when empty
    pub last_message_seq: i64,

    /// Commit time of the most recent message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,

    /// Inactive rooms reject all reads and writes
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(room_name: String, description: Option<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            room_id: Uuid::new_v4(),
            room_name,
            description,
            owner_id,
            last_message_seq: 0,
            last_message_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
