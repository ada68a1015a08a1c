pub mod repository;
pub mod test_utils;

pub use repository::error::RepositoryError;
pub use repository::message_operations::MessageOperations;

use surrealdb::{Surreal, engine::any::Any};

/// Apply the schema migration: table definitions, the identity and
/// (room_id, seq_no) uniqueness indexes, and the message search index.
/// Statements are idempotent, so running this on every startup is fine.
pub async fn apply_schema(db: &Surreal<Any>) -> Result<(), RepositoryError> {
    let migration_sql = include_str!("../migrations/confab.surql");
    db.query(migration_sql).await?.check()?;
    Ok(())
}
