use crate::auth::SessionService;
use crate::config::ServerConfig;
use crate::storage::ObjectStore;
use confab_surrealdb::MessageOperations;
use confab_surrealdb::repository::UserRepository;
use std::sync::Arc;
use surrealdb::{Surreal, engine::any::Any};

#[derive(Clone)]
pub struct AppState {
    pub db: Surreal<Any>,
    pub config: &'static ServerConfig,
    pub session_service: Arc<SessionService>,
    /// Service façade over the room message log
    pub message_operations: Arc<MessageOperations>,
    pub user_repository: Arc<UserRepository>,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        db: Surreal<Any>,
        config: &'static ServerConfig,
        session_service: Arc<SessionService>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        let message_operations = Arc::new(MessageOperations::new(db.clone()));
        let user_repository = Arc::new(UserRepository::new(db.clone()));

        Self { db, config, session_service, message_operations, user_repository, storage }
    }
}
