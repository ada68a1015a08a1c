use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Owner,
    Participant,
}

/// Membership record tying a user (or invited guest) to a room.
///
/// `user_id` is None for an externally invited guest who is known only by
/// email until they accept. Removal is a soft delete: `is_active` flips to
/// false and the row stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identity
    pub participant_id: Uuid,

    /// Room this membership belongs to
    pub room_id: Uuid,

    /// Linked user account; None until an invited guest accepts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    pub email: String,

    pub name: String,

    pub role: ParticipantRole,

    /// Sequence number of the newest message this participant has read.
    /// Monotonic: the tracker never moves it backwards.
    pub last_read_seq_no: i64,

    /// Stamped whenever the read cursor advances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        room_id: Uuid,
        user_id: Option<Uuid>,
        email: String,
        name: String,
        role: ParticipantRole,
    ) -> Self {
        Self {
            participant_id: Uuid::new_v4(),
            room_id,
            user_id,
            email,
            name,
            role,
            last_read_seq_no: 0,
            last_viewed_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
