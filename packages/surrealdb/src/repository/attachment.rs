use crate::repository::error::RepositoryError;
use confab_entity::Attachment;
use surrealdb::{Surreal, engine::any::Any};
use uuid::Uuid;

#[derive(Clone)]
pub struct AttachmentRepository {
    db: Surreal<Any>,
}

impl AttachmentRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Persist an attachment record. At upload time `message_id` is None:
    /// the file is durable before any message references it.
    pub async fn create(&self, attachment: &Attachment) -> Result<Attachment, RepositoryError> {
        let created: Option<Attachment> = self
            .db
            .create(("attachment", attachment.attachment_id.to_string()))
            .content(attachment.clone())
            .await?;

        created.ok_or_else(|| {
            RepositoryError::not_found("attachment", attachment.attachment_id.to_string())
        })
    }

    pub async fn get_by_id(
        &self,
        attachment_id: Uuid,
    ) -> Result<Option<Attachment>, RepositoryError> {
        let query = "SELECT * FROM attachment WHERE attachment_id = $attachment_id LIMIT 1";
        let mut response =
            self.db.query(query).bind(("attachment_id", attachment_id)).await?;
        let attachments: Vec<Attachment> = response.take(0)?;
        Ok(attachments.into_iter().next())
    }

    /// Bind an orphan attachment to its message. Binding the same pair again
    /// is an idempotent no-op; binding to a different message is a Conflict.
    pub async fn bind_to_message(
        &self,
        attachment_id: Uuid,
        message_id: Uuid,
    ) -> Result<Attachment, RepositoryError> {
        let existing = self
            .get_by_id(attachment_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("attachment", attachment_id.to_string()))?;

        match existing.message_id {
            Some(bound) if bound == message_id => return Ok(existing),
            Some(bound) => {
                return Err(RepositoryError::Conflict {
                    message: format!("attachment is already bound to message {bound}"),
                });
            },
            None => {},
        }

        let query = "
            UPDATE attachment SET message_id = $message_id
            WHERE attachment_id = $attachment_id AND message_id = NONE
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("attachment_id", attachment_id))
            .bind(("message_id", message_id))
            .await?;
        let updated: Vec<Attachment> = response.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Conflict {
                message: "attachment was bound concurrently".to_string(),
            })
    }

    pub async fn list_by_message(
        &self,
        message_id: Uuid,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let query = "
            SELECT * FROM attachment
            WHERE message_id = $message_id
            ORDER BY created_at ASC
        ";
        let mut response = self.db.query(query).bind(("message_id", message_id)).await?;
        let attachments: Vec<Attachment> = response.take(0)?;
        Ok(attachments)
    }

    /// Attachments bound to any of `message_ids`, for page hydration.
    pub async fn list_by_messages(
        &self,
        message_ids: &[Uuid],
    ) -> Result<Vec<Attachment>, RepositoryError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = "
            SELECT * FROM attachment
            WHERE message_id IN $message_ids
            ORDER BY created_at ASC
        ";
        let mut response =
            self.db.query(query).bind(("message_ids", message_ids.to_vec())).await?;
        let attachments: Vec<Attachment> = response.take(0)?;
        Ok(attachments)
    }

    pub async fn delete(&self, attachment_id: Uuid) -> Result<Attachment, RepositoryError> {
        let query = "DELETE attachment WHERE attachment_id = $attachment_id RETURN BEFORE";
        let mut response =
            self.db.query(query).bind(("attachment_id", attachment_id)).await?;
        let deleted: Vec<Attachment> = response.take(0)?;
        deleted
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found("attachment", attachment_id.to_string()))
    }
}
