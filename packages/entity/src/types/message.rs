use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Attachment, EntityValidationError};

/// Hard ceiling on message body length, matching the API validation rule.
pub const MAX_CONTENT_LENGTH: usize = 5000;

/// Closed set of message kinds in a room log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Standard message written by a human participant.
    UserMessage,
    /// Automated room event, e.g. a participant joining.
    SystemEvent,
    /// Automated notification that a meeting transcript was uploaded.
    MeetingTranscript,
}

/// One entry in the per-room, strictly ordered message log.
///
/// `seq_no` is assigned exactly once by the store, is unique within the room,
/// and increases monotonically in transaction-commit order. `author_id` is
/// absent for system and transcript messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message identity
    pub message_id: Uuid,

    /// Room this message belongs to
    pub room_id: Uuid,

    /// Author; None for system/automated messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Uuid>,

    /// Author display name, hydrated from the user table for responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Per-room monotonic position in the log
    pub seq_no: i64,

    /// Message body
    pub content: String,

    /// Message kind
    pub message_type: MessageType,

    /// Reactions and mentions; opaque to the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,

    /// Kind-specific payload; present iff `message_type` is MeetingTranscript
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,

    /// Whether the content was edited after creation
    pub edited: bool,

    /// Soft-delete marker; a set timestamp hides the row from every read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Bound attachments, hydrated at read time (not stored on the row)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Validate the invariants the store refuses to persist without:
    /// non-empty bounded content, and the transcript payload present
    /// exactly when the kind is MeetingTranscript.
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.content.is_empty() {
            return Err(EntityValidationError::new("content", "must not be empty"));
        }
        if self.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(EntityValidationError::new(
                "content",
                format!("must not exceed {} characters", MAX_CONTENT_LENGTH),
            ));
        }
        let has_transcript =
            self.extra_data.as_ref().map(|e| e.transcript.is_some()).unwrap_or(false);
        match self.message_type {
            MessageType::MeetingTranscript if !has_transcript => Err(EntityValidationError::new(
                "extra_data",
                "transcript payload is required for meeting_transcript messages",
            )),
            MessageType::UserMessage | MessageType::SystemEvent if has_transcript => {
                Err(EntityValidationError::new(
                    "extra_data",
                    "transcript payload is only allowed on meeting_transcript messages",
                ))
            },
            _ => Ok(()),
        }
    }
}

/// Free-form message metadata: reactions and @-mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
}

/// One emoji bucket: the set of users who reacted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub user_ids: Vec<Uuid>,
    pub count: i64,
}

/// Kind-specific payload container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<TranscriptData>,
}

/// Where an uploaded meeting transcript lives in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptData {
    pub bucket: String,
    pub region: String,
    pub keys: TranscriptKeys,
    pub urls: TranscriptUrls,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
}

/// Object-storage keys for the two transcript renditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptKeys {
    pub json: String,
    pub text: String,
}

/// Public HTTPS URLs for the two transcript renditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptUrls {
    pub json: String,
    pub text: String,
}
