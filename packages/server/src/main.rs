use std::sync::Arc;

use surrealdb::engine::any;
use tokio::net::TcpListener;
use tracing::info;

use confab_server::auth::SessionService;
use confab_server::config::ServerConfig;
use confab_server::state::AppState;
use confab_server::storage::MemoryObjectStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::init()?;

    let db = any::connect(&config.database_url).await.map_err(|e| {
        format!("Failed to connect to SurrealDB at '{}': {}", config.database_url, e)
    })?;
    db.use_ns(config.database_namespace.as_str())
        .use_db(config.database_name.as_str())
        .await?;

    confab_surrealdb::apply_schema(&db).await?;

    let session_service = Arc::new(SessionService::new(config.jwt_secret.as_bytes()));
    let storage = Arc::new(MemoryObjectStore::new(
        config.storage_bucket.clone(),
        config.storage_region.clone(),
    ));

    let app_state = AppState::new(db, config, session_service, storage);
    let app = confab_server::create_router(app_state);

    info!(address = %config.bind_address, "confab server listening");
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
