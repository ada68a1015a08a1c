use surrealdb::{Surreal, engine::any::Any};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TestUtilsError {
    #[error("Database connection failed: {0}")]
    DatabaseConnection(#[from] surrealdb::Error),

    #[error("Schema initialization failed: {message}")]
    SchemaInitialization { message: String },
}

/// Connect to an isolated in-memory database and apply the production
/// schema. Each call gets its own namespace and database, so tests never
/// see each other's rows.
pub async fn create_test_db() -> Result<Surreal<Any>, TestUtilsError> {
    let db = surrealdb::engine::any::connect("mem://")
        .await
        .map_err(TestUtilsError::DatabaseConnection)?;

    let suffix = Uuid::new_v4().simple().to_string();
    db.use_ns(format!("test_ns_{suffix}"))
        .use_db(format!("test_db_{suffix}"))
        .await
        .map_err(TestUtilsError::DatabaseConnection)?;

    crate::apply_schema(&db)
        .await
        .map_err(|e| TestUtilsError::SchemaInitialization { message: e.to_string() })?;

    Ok(db)
}
