use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Unauthorized access: {reason}")]
    Unauthorized { reason: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Duplicate reaction: user already reacted with {emoji}")]
    DuplicateReaction { emoji: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound { entity_type: entity_type.to_string(), id: id.into() }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation { field: field.to_string(), message: message.into() }
    }
}

impl From<confab_entity::EntityValidationError> for RepositoryError {
    fn from(err: confab_entity::EntityValidationError) -> Self {
        Self::Validation { field: err.field.to_string(), message: err.message }
    }
}
