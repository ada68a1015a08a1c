use crate::repository::error::RepositoryError;
use chrono::Utc;
use confab_entity::Participant;
use serde::Deserialize;
use surrealdb::{Surreal, engine::any::Any};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct ParticipantRepository {
    db: Surreal<Any>,
}

impl ParticipantRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Add a participant to a room. Re-adding someone who already has an
    /// active membership is a Conflict.
    pub async fn create(&self, participant: &Participant) -> Result<Participant, RepositoryError> {
        if let Some(user_id) = participant.user_id
            && self.get_by_room_user(participant.room_id, user_id).await?.is_some()
        {
            return Err(RepositoryError::Conflict {
                message: "user is already a participant in this room".to_string(),
            });
        }

        let created: Option<Participant> = self
            .db
            .create(("room_participant", participant.participant_id.to_string()))
            .content(participant.clone())
            .await?;

        created.ok_or_else(|| {
            RepositoryError::not_found("participant", participant.participant_id.to_string())
        })
    }

    pub async fn get_by_id(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<Participant>, RepositoryError> {
        let query = "
            SELECT * FROM room_participant
            WHERE participant_id = $participant_id AND is_active = true
            LIMIT 1
        ";
        let mut response =
            self.db.query(query).bind(("participant_id", participant_id)).await?;
        let participants: Vec<Participant> = response.take(0)?;
        Ok(participants.into_iter().next())
    }

    pub async fn get_by_room_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, RepositoryError> {
        let query = "
            SELECT * FROM room_participant
            WHERE room_id = $room_id AND user_id = $user_id AND is_active = true
            LIMIT 1
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("user_id", user_id))
            .await?;
        let participants: Vec<Participant> = response.take(0)?;
        Ok(participants.into_iter().next())
    }

    pub async fn list_by_room(&self, room_id: Uuid) -> Result<Vec<Participant>, RepositoryError> {
        let query = "
            SELECT * FROM room_participant
            WHERE room_id = $room_id AND is_active = true
            ORDER BY created_at ASC
        ";
        let mut response = self.db.query(query).bind(("room_id", room_id)).await?;
        let participants: Vec<Participant> = response.take(0)?;
        Ok(participants)
    }

    /// Whether a user may read and write in a room: they own it or hold an
    /// active membership.
    pub async fn has_access(&self, room_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let query = "
            SELECT count() FROM room_participant
            WHERE room_id = $room_id AND user_id = $user_id AND is_active = true
            GROUP ALL
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("user_id", user_id))
            .await?;
        let counts: Vec<CountRow> = response.take(0)?;
        if counts.first().map(|c| c.count).unwrap_or(0) > 0 {
            return Ok(true);
        }

        let query = "
            SELECT count() FROM room
            WHERE room_id = $room_id AND owner_id = $user_id AND is_active = true
            GROUP ALL
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("user_id", user_id))
            .await?;
        let counts: Vec<CountRow> = response.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0) > 0)
    }

    /// Soft-remove a participant: the row stays for history, membership ends.
    pub async fn remove(&self, participant_id: Uuid) -> Result<Participant, RepositoryError> {
        let query = "
            UPDATE room_participant SET is_active = false
            WHERE participant_id = $participant_id AND is_active = true
            RETURN AFTER
        ";
        let mut response =
            self.db.query(query).bind(("participant_id", participant_id)).await?;
        let removed: Vec<Participant> = response.take(0)?;
        removed
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found("participant", participant_id.to_string()))
    }

    /// Advance the participant's read cursor to `seq_no` and stamp the view
    /// time. Monotonic: a cursor already at or past `seq_no` is left where it
    /// is (the stale update is a silent no-op) and the current row is
    /// returned either way.
    pub async fn advance_read_cursor(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        seq_no: i64,
    ) -> Result<Participant, RepositoryError> {
        let query = "
            UPDATE room_participant
            SET last_read_seq_no = $seq_no, last_viewed_at = $now
            WHERE room_id = $room_id AND user_id = $user_id
              AND is_active = true AND last_read_seq_no < $seq_no
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("user_id", user_id))
            .bind(("seq_no", seq_no))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Participant> = response.take(0)?;
        if let Some(participant) = updated.into_iter().next() {
            return Ok(participant);
        }

        // Nothing matched: either the cursor was already ahead (fine) or the
        // membership does not exist.
        self.get_by_room_user(room_id, user_id).await?.ok_or_else(|| {
            RepositoryError::not_found("participant", format!("{room_id}/{user_id}"))
        })
    }
}
