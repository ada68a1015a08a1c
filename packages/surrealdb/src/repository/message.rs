use crate::repository::error::RepositoryError;
use chrono::{DateTime, Utc};
use confab_entity::{Message, MessageMetadata};
use std::time::Duration;
use surrealdb::{Surreal, engine::any::Any};
use tracing::warn;
use uuid::Uuid;

/// Page size bounds for backward pagination.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// How many times an insert retries when the sequence allocation loses an
/// optimistic-concurrency race before giving up.
const CREATE_RETRY_LIMIT: u32 = 8;

/// One page of a room's log, oldest first, plus whether older messages exist
/// beyond it.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct MessageRepository {
    db: Surreal<Any>,
}

impl MessageRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Append a message to its room's log.
    ///
    /// The room's sequence counter is bumped and the row inserted in one
    /// transaction, so committed messages form a gapless range in commit
    /// order. The caller's `seq_no` is ignored; the store assigns it. A lost
    /// optimistic-concurrency race is retried with backoff.
    pub async fn create(&self, message: &Message) -> Result<Message, RepositoryError> {
        message.validate()?;

        let query = "
            BEGIN TRANSACTION;
            LET $rooms = (
                UPDATE room
                SET last_message_seq += 1, last_message_at = $created_at, updated_at = $created_at
                WHERE room_id = $room_id AND is_active = true
                RETURN AFTER
            );
            IF array::len($rooms) == 0 { THROW \"room_not_found\" };
            CREATE message CONTENT {
                message_id: $message_id,
                room_id: $room_id,
                author_id: $author_id,
                author_name: $author_name,
                seq_no: $rooms[0].last_message_seq,
                content: $content,
                message_type: $message_type,
                metadata: $metadata,
                extra_data: $extra_data,
                edited: false,
                created_at: $created_at,
                updated_at: $created_at
            };
            COMMIT TRANSACTION;
        ";

        let mut attempt = 0;
        loop {
            attempt += 1;

            let result = self
                .db
                .query(query)
                .bind(("room_id", message.room_id))
                .bind(("message_id", message.message_id))
                .bind(("author_id", message.author_id))
                .bind(("author_name", message.author_name.clone()))
                .bind(("content", message.content.clone()))
                .bind(("message_type", message.message_type))
                .bind(("metadata", message.metadata.clone()))
                .bind(("extra_data", message.extra_data.clone()))
                .bind(("created_at", message.created_at))
                .await;

            let take_result = match result {
                Ok(mut response) => response.take::<Vec<Message>>(2),
                Err(e) => Err(e),
            };

            match take_result {
                Ok(created) => {
                    return created.into_iter().next().ok_or_else(|| {
                        RepositoryError::not_found("message", message.message_id.to_string())
                    });
                },
                Err(e) => {
                    let text = e.to_string();
                    if text.contains("room_not_found") {
                        return Err(RepositoryError::not_found(
                            "room",
                            message.room_id.to_string(),
                        ));
                    }
                    if Self::is_retryable(&text) && attempt < CREATE_RETRY_LIMIT {
                        warn!(
                            room_id = %message.room_id,
                            attempt,
                            "message insert lost a sequence race, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                        continue;
                    }
                    return Err(RepositoryError::Database(e));
                },
            }
        }
    }

    /// Transaction outcomes that mean "run it again", not "fail": a read or
    /// write conflict in the storage engine, or the unique (room_id, seq_no)
    /// backstop firing because another writer committed the same position.
    fn is_retryable(error_text: &str) -> bool {
        let lower = error_text.to_lowercase();
        lower.contains("conflict")
            || lower.contains("can be retried")
            || lower.contains("message_room_seq_idx")
    }

    /// Fetch a live message. Soft-deleted rows are invisible here.
    pub async fn get_by_id(&self, message_id: Uuid) -> Result<Option<Message>, RepositoryError> {
        let query = "
            SELECT * FROM message
            WHERE message_id = $message_id AND deleted_at = NONE
            LIMIT 1
        ";
        let mut response = self.db.query(query).bind(("message_id", message_id)).await?;
        let messages: Vec<Message> = response.take(0)?;
        Ok(messages.into_iter().next())
    }

    /// One page of the room's log, walking backward from `before_seq`
    /// (exclusive), or from the newest message when `before_seq` is None.
    /// Returned oldest-first; `has_more` says whether older messages remain.
    pub async fn get_page(
        &self,
        room_id: Uuid,
        before_seq: Option<i64>,
        limit: Option<i64>,
    ) -> Result<MessagePage, RepositoryError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let query = match before_seq {
            Some(_) => {
                "
                SELECT * FROM message
                WHERE room_id = $room_id AND deleted_at = NONE AND seq_no < $before_seq
                ORDER BY seq_no DESC
                LIMIT $limit
                "
            },
            None => {
                "
                SELECT * FROM message
                WHERE room_id = $room_id AND deleted_at = NONE
                ORDER BY seq_no DESC
                LIMIT $limit
                "
            },
        };

        let mut request = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            // One extra row tells us whether the page is the last one.
            .bind(("limit", limit + 1));
        if let Some(before_seq) = before_seq {
            request = request.bind(("before_seq", before_seq));
        }

        let mut response = request.await?;
        let mut messages: Vec<Message> = response.take(0)?;

        let has_more = messages.len() as i64 > limit;
        messages.truncate(limit as usize);
        messages.reverse();

        Ok(MessagePage { messages, has_more })
    }

    /// Replace a message's body and mark it edited.
    pub async fn update_content(
        &self,
        message_id: Uuid,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let query = "
            UPDATE message
            SET content = $content, edited = true, updated_at = $now
            WHERE message_id = $message_id AND deleted_at = NONE
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("message_id", message_id))
            .bind(("content", content))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Message> = response.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))
    }

    /// Soft-delete: the row keeps its seq_no (no renumbering) but disappears
    /// from every read path. Deleting an already-deleted message is NotFound.
    pub async fn soft_delete(&self, message_id: Uuid) -> Result<(), RepositoryError> {
        let query = "
            UPDATE message
            SET deleted_at = $now, updated_at = $now
            WHERE message_id = $message_id AND deleted_at = NONE
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("message_id", message_id))
            .bind(("now", Utc::now()))
            .await?;
        let deleted: Vec<Message> = response.take(0)?;
        if deleted.is_empty() {
            return Err(RepositoryError::not_found("message", message_id.to_string()));
        }
        Ok(())
    }

    pub async fn update_metadata(
        &self,
        message_id: Uuid,
        metadata: MessageMetadata,
    ) -> Result<Message, RepositoryError> {
        let query = "
            UPDATE message
            SET metadata = $metadata, updated_at = $now
            WHERE message_id = $message_id AND deleted_at = NONE
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("message_id", message_id))
            .bind(("metadata", metadata))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Message> = response.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found("message", message_id.to_string()))
    }

    /// Full-text search within one room, newest first.
    pub async fn search(
        &self,
        room_id: Uuid,
        term: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let query = "
            SELECT * FROM message
            WHERE room_id = $room_id AND deleted_at = NONE AND content @@ $term
            ORDER BY seq_no DESC
            LIMIT $limit
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("term", term.to_string()))
            .bind(("limit", limit))
            .await?;
        let messages: Vec<Message> = response.take(0)?;
        Ok(messages)
    }

    /// Count of live messages past a participant's read cursor.
    pub async fn count_after(
        &self,
        room_id: Uuid,
        after_seq: i64,
    ) -> Result<i64, RepositoryError> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            count: i64,
        }

        let query = "
            SELECT count() FROM message
            WHERE room_id = $room_id AND deleted_at = NONE AND seq_no > $after_seq
            GROUP ALL
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("after_seq", after_seq))
            .await?;
        let counts: Vec<CountRow> = response.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// A transcript message already ingested for this (room, session window),
    /// if any. Webhook retries dedupe against this.
    pub async fn find_transcript_for_session(
        &self,
        room_id: Uuid,
        session_start: DateTime<Utc>,
        session_end: DateTime<Utc>,
    ) -> Result<Option<Message>, RepositoryError> {
        let query = "
            SELECT * FROM message
            WHERE room_id = $room_id
              AND message_type = 'meeting_transcript'
              AND deleted_at = NONE
              AND extra_data.transcript.session_start = $session_start
              AND extra_data.transcript.session_end = $session_end
            LIMIT 1
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("session_start", session_start))
            .bind(("session_end", session_end))
            .await?;
        let messages: Vec<Message> = response.take(0)?;
        Ok(messages.into_iter().next())
    }
}
