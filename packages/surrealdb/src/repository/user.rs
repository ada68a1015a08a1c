use crate::repository::error::RepositoryError;
use confab_entity::User;
use surrealdb::{Surreal, engine::any::Any};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    db: Surreal<Any>,
}

impl UserRepository {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    pub async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let created: Option<User> = self
            .db
            .create(("app_user", user.user_id.to_string()))
            .content(user.clone())
            .await
            .map_err(|e| {
                if e.to_string().contains("app_user_email_idx") {
                    RepositoryError::Conflict {
                        message: format!("email '{}' is already registered", user.email),
                    }
                } else {
                    RepositoryError::Database(e)
                }
            })?;

        created.ok_or_else(|| RepositoryError::not_found("user", user.user_id.to_string()))
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let query = "SELECT * FROM app_user WHERE user_id = $user_id LIMIT 1";
        let mut response = self.db.query(query).bind(("user_id", user_id)).await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let query = "SELECT * FROM app_user WHERE email = $email LIMIT 1";
        let mut response = self.db.query(query).bind(("email", email.to_string())).await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }
}
