pub mod attachment;
pub mod message;
pub mod participant;
pub mod room;
pub mod user;

pub use attachment::Attachment;
pub use message::{
    ExtraData, Message, MessageMetadata, MessageType, Reaction, TranscriptData, TranscriptKeys,
    TranscriptUrls, MAX_CONTENT_LENGTH,
};
pub use participant::{Participant, ParticipantRole};
pub use room::Room;
pub use user::User;

use thiserror::Error;

/// Entity-level validation failure. Repositories refuse to persist an
/// entity that does not validate.
#[derive(Debug, Clone, Error)]
#[error("invalid {field}: {message}")]
pub struct EntityValidationError {
    pub field: &'static str,
    pub message: String,
}

impl EntityValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}
