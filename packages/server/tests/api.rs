use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use confab_server::auth::SessionService;
use confab_server::config::ServerConfig;
use confab_server::state::AppState;
use confab_server::storage::{MemoryObjectStore, ObjectStore};
use confab_surrealdb::test_utils::create_test_db;

const TEST_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

async fn test_app() -> (Router, AppState) {
    let db = create_test_db().await.expect("test db");

    let config: &'static ServerConfig = Box::leak(Box::new(ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: "memory".to_string(),
        database_namespace: "confab".to_string(),
        database_name: "test".to_string(),
        jwt_secret: String::from_utf8_lossy(TEST_SECRET).to_string(),
        storage_bucket: "confab-test".to_string(),
        storage_region: "eu-west-1".to_string(),
    }));

    let session_service = Arc::new(SessionService::new(TEST_SECRET));
    let storage = Arc::new(MemoryObjectStore::new(
        config.storage_bucket.clone(),
        config.storage_region.clone(),
    ));

    let state = AppState::new(db, config, session_service, storage);
    (confab_server::create_router(state.clone()), state)
}

fn token_for(user_id: Uuid, name: &str, email: &str) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "name": name,
        "email": email,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET)).expect("token")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn authed_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

async fn create_room(app: &Router, token: &str, room_name: &str) -> Value {
    let (status, body) = send(
        app,
        authed_json("POST", "/api/rooms", token, json!({ "room_name": room_name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

fn webhook_payload(room_name: &str) -> Value {
    json!({
        "event": "transcript_uploaded",
        "room_name": room_name,
        "session_start": "2026-03-10T09:00:00Z",
        "session_end": "2026-03-10T10:00:00Z",
        "transcript_paths": {
            "json": "transcripts/session.json",
            "text": "transcripts/session.txt",
            "json_https_url": "https://cdn.example.com/session.json",
            "text_https_url": "https://cdn.example.com/session.txt"
        },
        "s3_keys": {
            "json": "transcripts/session.json",
            "text": "transcripts/session.txt"
        },
        "bucket": "meeting-transcripts",
        "region": "eu-west-1",
        "item_count": 12
    })
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/api/rooms").body(Body::empty()).expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errcode"], "C_UNAUTHORIZED");
}

#[tokio::test]
async fn message_round_trip_through_the_api() {
    let (app, _) = test_app().await;
    let alice = Uuid::new_v4();
    let token = token_for(alice, "Alice", "alice@example.com");

    let room = create_room(&app, &token, "standup").await;
    let room_id = room["room_id"].as_str().expect("room_id").to_string();

    let (status, message) = send(
        &app,
        authed_json(
            "POST",
            &format!("/api/rooms/{room_id}/messages"),
            &token,
            json!({ "content": "hello" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["seq_no"], 1);
    assert_eq!(message["author_name"], "Alice");

    let (status, page) =
        send(&app, authed_get(&format!("/api/rooms/{room_id}/messages"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["has_more"], false);
    assert_eq!(page["messages"][0]["content"], "hello");

    // Oversized content is rejected before it reaches the log.
    let (status, _) = send(
        &app,
        authed_json(
            "POST",
            &format!("/api/rooms/{room_id}/messages"),
            &token,
            json!({ "content": "x".repeat(5001) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_author_may_edit() {
    let (app, _) = test_app().await;
    let alice = Uuid::new_v4();
    let alice_token = token_for(alice, "Alice", "alice@example.com");
    let mallory_token = token_for(Uuid::new_v4(), "Mallory", "mallory@example.com");

    let room = create_room(&app, &alice_token, "standup").await;
    let room_id = room["room_id"].as_str().expect("room_id").to_string();

    let (_, message) = send(
        &app,
        authed_json(
            "POST",
            &format!("/api/rooms/{room_id}/messages"),
            &alice_token,
            json!({ "content": "original" }),
        ),
    )
    .await;
    let message_id = message["message_id"].as_str().expect("message_id").to_string();

    let (status, body) = send(
        &app,
        authed_json(
            "PUT",
            &format!("/api/messages/{message_id}"),
            &mallory_token,
            json!({ "content": "hijacked" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errcode"], "C_FORBIDDEN");

    let (status, edited) = send(
        &app,
        authed_json(
            "PUT",
            &format!("/api/messages/{message_id}"),
            &alice_token,
            json!({ "content": "fixed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["content"], "fixed");
    assert_eq!(edited["edited"], true);
}

#[tokio::test]
async fn read_cursor_flow() {
    let (app, _) = test_app().await;
    let alice = Uuid::new_v4();
    let token = token_for(alice, "Alice", "alice@example.com");

    let room = create_room(&app, &token, "standup").await;
    let room_id = room["room_id"].as_str().expect("room_id").to_string();

    for i in 0..3 {
        let (status, _) = send(
            &app,
            authed_json(
                "POST",
                &format!("/api/rooms/{room_id}/messages"),
                &token,
                json!({ "content": format!("m{i}") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, unread) =
        send(&app, authed_get(&format!("/api/rooms/{room_id}/unread"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread["unread_count"], 3);

    let (status, cursor) = send(
        &app,
        authed_json("POST", &format!("/api/rooms/{room_id}/read"), &token, json!({ "seq_no": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cursor["last_read_seq_no"], 3);

    // Stale update leaves the cursor where it is.
    let (status, cursor) = send(
        &app,
        authed_json("POST", &format!("/api/rooms/{room_id}/read"), &token, json!({ "seq_no": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cursor["last_read_seq_no"], 3);

    let (_, unread) =
        send(&app, authed_get(&format!("/api/rooms/{room_id}/unread"), &token)).await;
    assert_eq!(unread["unread_count"], 0);
}

#[tokio::test]
async fn webhook_ingests_and_deduplicates() {
    let (app, _) = test_app().await;
    let token = token_for(Uuid::new_v4(), "Alice", "alice@example.com");
    let room = create_room(&app, &token, "standup").await;
    let room_id = room["room_id"].as_str().expect("room_id").to_string();

    let request = |payload: Value| {
        Request::builder()
            .method("POST")
            .uri("/api/agent-webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    };

    let (status, first) = send(&app, request(webhook_payload("standup"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");

    // Retried delivery: acked, no duplicate appended.
    let (status, second) = send(&app, request(webhook_payload("standup"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message_id"], first["message_id"]);

    let (_, page) =
        send(&app, authed_get(&format!("/api/rooms/{room_id}/messages"), &token)).await;
    assert_eq!(page["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["messages"][0]["message_type"], "meeting_transcript");

    let (status, _) = send(&app, request(webhook_payload("no-such-room"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut bad_event = webhook_payload("standup");
    bad_event["event"] = json!("recording_started");
    let (status, _) = send(&app, request(bad_event)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transcript_download_requires_the_exact_stored_key() {
    let (app, state) = test_app().await;
    let token = token_for(Uuid::new_v4(), "Alice", "alice@example.com");
    let room = create_room(&app, &token, "standup").await;
    let room_id = room["room_id"].as_str().expect("room_id").to_string();

    state
        .storage
        .put("transcripts/session.txt", Bytes::from_static(b"hello transcript"), "text/plain")
        .await
        .expect("seed object");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/agent-webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(webhook_payload("standup").to_string()))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message_id = body["message_id"].as_str().expect("message_id").to_string();

    let response = app
        .clone()
        .oneshot(authed_get(
            &format!("/api/rooms/{room_id}/transcript/{message_id}/transcripts/session.txt"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], b"hello transcript");

    // A key the message does not own is invisible, even if it exists.
    let (status, _) = send(
        &app,
        authed_get(
            &format!("/api/rooms/{room_id}/transcript/{message_id}/transcripts/other.txt"),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
