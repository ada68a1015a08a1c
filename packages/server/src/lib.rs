pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;

pub use crate::auth::SessionService;
pub use crate::config::ServerConfig;
pub use crate::state::AppState;

use axum::{
    Router,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::get))
        // Agent callbacks (machine clients, no user session)
        .route("/api/agent-webhook", post(api::agent_webhook::post))
        // Rooms
        .route("/api/rooms", post(api::rooms::post).get(api::rooms::get))
        .route(
            "/api/rooms/{room_id}",
            get(api::rooms::by_room_id::get).delete(api::rooms::by_room_id::delete),
        )
        // Participants
        .route(
            "/api/rooms/{room_id}/participants",
            post(api::rooms::by_room_id::participants::post)
                .get(api::rooms::by_room_id::participants::get),
        )
        .route(
            "/api/rooms/{room_id}/participants/{participant_id}",
            delete(api::rooms::by_room_id::participants::by_participant_id_delete),
        )
        // The room message log
        .route(
            "/api/rooms/{room_id}/messages",
            post(api::rooms::by_room_id::messages::post)
                .get(api::rooms::by_room_id::messages::get),
        )
        .route(
            "/api/rooms/{room_id}/messages/search",
            get(api::rooms::by_room_id::messages::search_get),
        )
        .route(
            "/api/messages/{message_id}",
            put(api::messages::by_message_id::put).delete(api::messages::by_message_id::delete),
        )
        .route(
            "/api/messages/{message_id}/reactions",
            post(api::messages::by_message_id::reactions_post),
        )
        // Read cursors
        .route("/api/rooms/{room_id}/read", post(api::rooms::by_room_id::read_status::post))
        .route(
            "/api/rooms/{room_id}/unread",
            get(api::rooms::by_room_id::read_status::unread_get),
        )
        // Attachments and transcripts
        .route(
            "/api/rooms/{room_id}/attachments",
            post(api::rooms::by_room_id::attachments::post),
        )
        .route(
            "/api/rooms/{room_id}/transcript/{message_id}/{*key}",
            get(api::rooms::by_room_id::transcript::get),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .fallback(handler_404)
}

async fn handler_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
