use crate::repository::attachment::AttachmentRepository;
use crate::repository::error::RepositoryError;
use crate::repository::message::{MessagePage, MessageRepository};
use crate::repository::participant::ParticipantRepository;
use crate::repository::room::RoomRepository;
use crate::repository::user::UserRepository;
use chrono::{DateTime, Utc};
use confab_entity::{
    Attachment, ExtraData, Message, MessageMetadata, MessageType, Participant, ParticipantRole,
    Reaction, Room, TranscriptData, TranscriptKeys, TranscriptUrls,
};
use serde::Deserialize;
use std::collections::HashMap;
use surrealdb::{Surreal, engine::any::Any};
use tracing::{info, warn};
use uuid::Uuid;

/// Transcript-ready notification pushed by the meeting agent after it
/// finishes uploading a session's transcript to object storage.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptNotification {
    pub event: String,
    pub room_name: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    #[serde(default)]
    pub transcript_paths: TranscriptPaths,
    pub s3_keys: TranscriptObjectKeys,
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub item_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptPaths {
    #[serde(default)]
    pub json: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub json_https_url: String,
    #[serde(default)]
    pub text_https_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptObjectKeys {
    pub json: String,
    pub text: String,
}

/// Service façade over the room message log.
///
/// Every public operation enforces room access before touching the log, so
/// handlers never talk to the repositories directly.
#[derive(Clone)]
pub struct MessageOperations {
    messages: MessageRepository,
    rooms: RoomRepository,
    participants: ParticipantRepository,
    attachments: AttachmentRepository,
    users: UserRepository,
}

impl MessageOperations {
    pub fn new(db: Surreal<Any>) -> Self {
        Self {
            messages: MessageRepository::new(db.clone()),
            rooms: RoomRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            attachments: AttachmentRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    async fn require_access(&self, room_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        if !self.participants.has_access(room_id, user_id).await? {
            return Err(RepositoryError::AccessDenied {
                reason: "user is not a member of this room".to_string(),
            });
        }
        Ok(())
    }

    /// Create a room and seed its participant list with the owner.
    pub async fn create_room(
        &self,
        room_name: String,
        description: Option<String>,
        owner_id: Uuid,
    ) -> Result<Room, RepositoryError> {
        let owner = self
            .users
            .get_by_id(owner_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("user", owner_id.to_string()))?;

        let room = self.rooms.create(&Room::new(room_name, description, owner_id)).await?;

        let participant = Participant::new(
            room.room_id,
            Some(owner_id),
            owner.email,
            owner.name,
            ParticipantRole::Owner,
        );
        self.participants.create(&participant).await?;

        info!(room_id = %room.room_id, room_name = %room.room_name, "room created");
        Ok(room)
    }

    pub async fn get_room(&self, room_id: Uuid, user_id: Uuid) -> Result<Room, RepositoryError> {
        self.require_access(room_id, user_id).await?;
        self.rooms
            .get_by_id(room_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| RepositoryError::not_found("room", room_id.to_string()))
    }

    pub async fn list_rooms(&self, user_id: Uuid) -> Result<Vec<Room>, RepositoryError> {
        self.rooms.list_for_user(user_id).await
    }

    /// Deactivate a room. Owner only.
    pub async fn delete_room(&self, room_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        let room = self
            .rooms
            .get_by_id(room_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("room", room_id.to_string()))?;
        if room.owner_id != user_id {
            return Err(RepositoryError::AccessDenied {
                reason: "only the room owner can delete the room".to_string(),
            });
        }
        self.rooms.deactivate(room_id).await
    }

    /// Add a participant and record the join in the room log as a system
    /// event.
    pub async fn add_participant(
        &self,
        room_id: Uuid,
        acting_user_id: Uuid,
        user_id: Option<Uuid>,
        email: String,
        name: String,
    ) -> Result<Participant, RepositoryError> {
        self.require_access(room_id, acting_user_id).await?;

        let participant = self
            .participants
            .create(&Participant::new(
                room_id,
                user_id,
                email,
                name.clone(),
                ParticipantRole::Participant,
            ))
            .await?;

        self.create_system_event(room_id, format!("{name} joined the room")).await?;
        Ok(participant)
    }

    pub async fn list_participants(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Participant>, RepositoryError> {
        self.require_access(room_id, user_id).await?;
        self.participants.list_by_room(room_id).await
    }

    /// Remove a participant. Allowed for the room owner or the participant
    /// themselves. The departure lands in the log as a system event.
    pub async fn remove_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let room = self
            .rooms
            .get_by_id(room_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("room", room_id.to_string()))?;
        let participant = self
            .participants
            .get_by_id(participant_id)
            .await?
            .filter(|p| p.room_id == room_id)
            .ok_or_else(|| {
                RepositoryError::not_found("participant", participant_id.to_string())
            })?;

        let is_owner = room.owner_id == acting_user_id;
        let is_self = participant.user_id == Some(acting_user_id);
        if !is_owner && !is_self {
            return Err(RepositoryError::AccessDenied {
                reason: "only the room owner or the participant can remove a membership"
                    .to_string(),
            });
        }

        let removed = self.participants.remove(participant_id).await?;
        self.create_system_event(room_id, format!("{} left the room", removed.name)).await?;
        Ok(())
    }

    /// Append a user message to the room log, then bind any pre-uploaded
    /// attachments to it.
    ///
    /// Binding runs after the message is committed and is best-effort: a
    /// failed bind is logged and skipped, never unwinding the committed
    /// message.
    pub async fn create_message(
        &self,
        room_id: Uuid,
        author_id: Uuid,
        content: String,
        mentions: Vec<String>,
        attachment_ids: Vec<Uuid>,
    ) -> Result<Message, RepositoryError> {
        self.require_access(room_id, author_id).await?;

        let author_name = self.users.get_by_id(author_id).await?.map(|u| u.name);
        let metadata = if mentions.is_empty() {
            None
        } else {
            Some(MessageMetadata { reactions: Vec::new(), mentions })
        };

        let now = Utc::now();
        let message = Message {
            message_id: Uuid::new_v4(),
            room_id,
            author_id: Some(author_id),
            author_name,
            seq_no: 0, // assigned by the store
            content,
            message_type: MessageType::UserMessage,
            metadata,
            extra_data: None,
            edited: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            attachments: Vec::new(),
        };

        let mut created = self.messages.create(&message).await?;

        for attachment_id in attachment_ids {
            match self.attachments.bind_to_message(attachment_id, created.message_id).await {
                Ok(attachment) => created.attachments.push(attachment),
                Err(e) => {
                    warn!(
                        message_id = %created.message_id,
                        attachment_id = %attachment_id,
                        error = %e,
                        "attachment binding failed, message kept without it"
                    );
                },
            }
        }

        Ok(created)
    }

    /// Append an automated room event (joins, departures) to the log.
    pub async fn create_system_event(
        &self,
        room_id: Uuid,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let now = Utc::now();
        let message = Message {
            message_id: Uuid::new_v4(),
            room_id,
            author_id: None,
            author_name: None,
            seq_no: 0,
            content,
            message_type: MessageType::SystemEvent,
            metadata: None,
            extra_data: None,
            edited: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            attachments: Vec::new(),
        };
        self.messages.create(&message).await
    }

    /// Ingest a transcript-ready notification: resolve the room by name and
    /// append a meeting_transcript message carrying the storage coordinates.
    ///
    /// Idempotent per (room, session window): a retried delivery returns the
    /// already-ingested message instead of appending a duplicate.
    pub async fn ingest_transcript(
        &self,
        notification: TranscriptNotification,
    ) -> Result<Message, RepositoryError> {
        let room = self
            .rooms
            .get_by_name(&notification.room_name)
            .await?
            .ok_or_else(|| RepositoryError::not_found("room", notification.room_name.clone()))?;

        if let Some(existing) = self
            .messages
            .find_transcript_for_session(
                room.room_id,
                notification.session_start,
                notification.session_end,
            )
            .await?
        {
            info!(
                room_id = %room.room_id,
                message_id = %existing.message_id,
                "duplicate transcript notification, returning existing message"
            );
            return Ok(existing);
        }

        let now = Utc::now();
        let message = Message {
            message_id: Uuid::new_v4(),
            room_id: room.room_id,
            author_id: None,
            author_name: None,
            seq_no: 0,
            content: "Meeting transcript is available.".to_string(),
            message_type: MessageType::MeetingTranscript,
            metadata: None,
            extra_data: Some(ExtraData {
                transcript: Some(TranscriptData {
                    bucket: notification.bucket,
                    region: notification.region,
                    keys: TranscriptKeys {
                        json: notification.s3_keys.json,
                        text: notification.s3_keys.text,
                    },
                    urls: TranscriptUrls {
                        json: notification.transcript_paths.json_https_url,
                        text: notification.transcript_paths.text_https_url,
                    },
                    session_start: notification.session_start,
                    session_end: notification.session_end,
                }),
            }),
            edited: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            attachments: Vec::new(),
        };
        self.messages.create(&message).await
    }

    /// One page of the room log, oldest first, attachments hydrated.
    pub async fn get_messages(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        before_seq: Option<i64>,
        limit: Option<i64>,
    ) -> Result<MessagePage, RepositoryError> {
        self.require_access(room_id, user_id).await?;
        let mut page = self.messages.get_page(room_id, before_seq, limit).await?;
        self.hydrate_attachments(&mut page.messages).await?;
        Ok(page)
    }

    pub async fn get_message(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<Message, RepositoryError> {
        let mut message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))?;
        self.require_access(message.room_id, user_id).await?;
        message.attachments = self.attachments.list_by_message(message_id).await?;
        Ok(message)
    }

    /// Edit a message body. Author only; seq_no and log position are
    /// untouched.
    pub async fn edit_message(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> Result<Message, RepositoryError> {
        if content.is_empty() {
            return Err(RepositoryError::validation("content", "must not be empty"));
        }
        if content.chars().count() > confab_entity::MAX_CONTENT_LENGTH {
            return Err(RepositoryError::validation(
                "content",
                format!("must not exceed {} characters", confab_entity::MAX_CONTENT_LENGTH),
            ));
        }

        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))?;
        if message.author_id != Some(user_id) {
            return Err(RepositoryError::AccessDenied {
                reason: "only the author can edit a message".to_string(),
            });
        }

        self.messages.update_content(message_id, content).await
    }

    /// Soft-delete a message. Author only. Repeating the delete is NotFound
    /// because the row is already invisible.
    pub async fn delete_message(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))?;
        if message.author_id != Some(user_id) {
            return Err(RepositoryError::AccessDenied {
                reason: "only the author can delete a message".to_string(),
            });
        }

        self.messages.soft_delete(message_id).await
    }

    /// React to a message. One reaction per (user, emoji, message); a repeat
    /// is rejected as DuplicateReaction.
    pub async fn add_reaction(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        emoji: String,
    ) -> Result<Message, RepositoryError> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))?;
        self.require_access(message.room_id, user_id).await?;

        let mut metadata = message.metadata.unwrap_or_default();
        match metadata.reactions.iter_mut().find(|r| r.emoji == emoji) {
            Some(reaction) => {
                if reaction.user_ids.contains(&user_id) {
                    return Err(RepositoryError::DuplicateReaction { emoji });
                }
                reaction.user_ids.push(user_id);
                reaction.count += 1;
            },
            None => {
                metadata.reactions.push(Reaction {
                    emoji,
                    user_ids: vec![user_id],
                    count: 1,
                });
            },
        }

        self.messages.update_metadata(message_id, metadata).await
    }

    /// Full-text search within a room the user belongs to.
    pub async fn search_messages(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        term: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.require_access(room_id, user_id).await?;
        let mut messages = self.messages.search(room_id, term, limit).await?;
        self.hydrate_attachments(&mut messages).await?;
        Ok(messages)
    }

    /// Move the caller's read cursor forward. Stale positions are a silent
    /// no-op; the cursor never moves backwards.
    pub async fn mark_read(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        seq_no: i64,
    ) -> Result<Participant, RepositoryError> {
        self.participants.advance_read_cursor(room_id, user_id, seq_no).await
    }

    /// Live messages past the caller's read cursor. Derived, never stored.
    pub async fn unread_count(&self, room_id: Uuid, user_id: Uuid) -> Result<i64, RepositoryError> {
        let participant =
            self.participants.get_by_room_user(room_id, user_id).await?.ok_or_else(|| {
                RepositoryError::AccessDenied {
                    reason: "user is not a member of this room".to_string(),
                }
            })?;
        self.messages.count_after(room_id, participant.last_read_seq_no).await
    }

    /// Record an uploaded file as an orphan attachment, ready to be bound to
    /// a message later.
    pub async fn register_attachment(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        attachment: Attachment,
    ) -> Result<Attachment, RepositoryError> {
        self.require_access(room_id, user_id).await?;
        self.attachments.create(&attachment).await
    }

    async fn hydrate_attachments(
        &self,
        messages: &mut [Message],
    ) -> Result<(), RepositoryError> {
        let ids: Vec<Uuid> = messages.iter().map(|m| m.message_id).collect();
        if ids.is_empty() {
            return Ok(());
        }

        let mut by_message: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for attachment in self.attachments.list_by_messages(&ids).await? {
            if let Some(message_id) = attachment.message_id {
                by_message.entry(message_id).or_default().push(attachment);
            }
        }

        for message in messages.iter_mut() {
            if let Some(attachments) = by_message.remove(&message.message_id) {
                message.attachments = attachments;
            }
        }
        Ok(())
    }
}
