use crate::repository::error::RepositoryError;
use chrono::Utc;
use confab_entity::Room;
use surrealdb::{Surreal, engine::any::Any};
use uuid::Uuid;

#[derive(Clone)]
pub struct RoomRepository {
    db: Surreal<Any>,
}

impl RoomRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Persist a new room. Room names are unique; a clash surfaces as Conflict.
    pub async fn create(&self, room: &Room) -> Result<Room, RepositoryError> {
        let created: Option<Room> = self
            .db
            .create(("room", room.room_id.to_string()))
            .content(room.clone())
            .await
            .map_err(|e| {
                if e.to_string().contains("room_room_name_idx") {
                    RepositoryError::Conflict {
                        message: format!("room name '{}' is already taken", room.room_name),
                    }
                } else {
                    RepositoryError::Database(e)
                }
            })?;

        created.ok_or_else(|| RepositoryError::not_found("room", room.room_id.to_string()))
    }

    pub async fn get_by_id(&self, room_id: Uuid) -> Result<Option<Room>, RepositoryError> {
        let query = "SELECT * FROM room WHERE room_id = $room_id LIMIT 1";
        let mut response = self.db.query(query).bind(("room_id", room_id)).await?;
        let rooms: Vec<Room> = response.take(0)?;
        Ok(rooms.into_iter().next())
    }

    /// Look up a room by its unique name. Webhook payloads address rooms
    /// this way.
    pub async fn get_by_name(&self, room_name: &str) -> Result<Option<Room>, RepositoryError> {
        let query = "SELECT * FROM room WHERE room_name = $room_name AND is_active = true LIMIT 1";
        let mut response =
            self.db.query(query).bind(("room_name", room_name.to_string())).await?;
        let rooms: Vec<Room> = response.take(0)?;
        Ok(rooms.into_iter().next())
    }

    /// Rooms a user can see: rooms they own plus rooms they participate in.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Room>, RepositoryError> {
        let query = "
            SELECT * FROM room
            WHERE is_active = true
              AND (owner_id = $user_id
                   OR room_id IN (
                       SELECT VALUE room_id FROM room_participant
                       WHERE user_id = $user_id AND is_active = true
                   ))
            ORDER BY created_at DESC
        ";
        let mut response = self.db.query(query).bind(("user_id", user_id)).await?;
        let rooms: Vec<Room> = response.take(0)?;
        Ok(rooms)
    }

    /// Soft-deactivate a room. Inactive rooms reject all message reads
    /// and writes.
    pub async fn deactivate(&self, room_id: Uuid) -> Result<(), RepositoryError> {
        let query = "
            UPDATE room SET is_active = false, updated_at = $now
            WHERE room_id = $room_id AND is_active = true
            RETURN AFTER
        ";
        let mut response = self
            .db
            .query(query)
            .bind(("room_id", room_id))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Room> = response.take(0)?;
        if updated.is_empty() {
            return Err(RepositoryError::not_found("room", room_id.to_string()));
        }
        Ok(())
    }
}
