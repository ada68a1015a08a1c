use crate::repository::message_operations::{
    MessageOperations, TranscriptNotification, TranscriptObjectKeys, TranscriptPaths,
};
use crate::repository::user::UserRepository;
use crate::repository::RepositoryError;
use crate::test_utils::create_test_db;
use chrono::{TimeZone, Utc};
use confab_entity::{Attachment, MessageType, Room, User};
use uuid::Uuid;

async fn setup() -> (MessageOperations, UserRepository, User, Room) {
    let db = create_test_db().await.expect("test db");
    let ops = MessageOperations::new(db.clone());
    let users = UserRepository::new(db);

    let owner = users
        .create(&User::new("Alice".to_string(), "alice@example.com".to_string()))
        .await
        .expect("owner");
    let room = ops
        .create_room("standup".to_string(), None, owner.user_id)
        .await
        .expect("room");

    (ops, users, owner, room)
}

async fn join_user(
    ops: &MessageOperations,
    users: &UserRepository,
    room: &Room,
    acting: Uuid,
    name: &str,
    email: &str,
) -> User {
    let user = users
        .create(&User::new(name.to_string(), email.to_string()))
        .await
        .expect("user");
    ops.add_participant(
        room.room_id,
        acting,
        Some(user.user_id),
        user.email.clone(),
        user.name.clone(),
    )
    .await
    .expect("participant");
    user
}

fn transcript_notification(room_name: &str, start_hour: u32) -> TranscriptNotification {
    TranscriptNotification {
        event: "transcript_uploaded".to_string(),
        room_name: room_name.to_string(),
        session_start: Utc.with_ymd_and_hms(2026, 3, 10, start_hour, 0, 0).single().expect("ts"),
        session_end: Utc.with_ymd_and_hms(2026, 3, 10, start_hour + 1, 0, 0).single().expect("ts"),
        transcript_paths: TranscriptPaths {
            json: "transcripts/standup.json".to_string(),
            text: "transcripts/standup.txt".to_string(),
            json_https_url: "https://cdn.example.com/standup.json".to_string(),
            text_https_url: "https://cdn.example.com/standup.txt".to_string(),
        },
        s3_keys: TranscriptObjectKeys {
            json: "transcripts/standup.json".to_string(),
            text: "transcripts/standup.txt".to_string(),
        },
        bucket: "meeting-transcripts".to_string(),
        region: "eu-west-1".to_string(),
        item_count: 42,
    }
}

#[tokio::test]
async fn messages_get_contiguous_sequence_numbers() {
    let (ops, _, owner, room) = setup().await;

    for i in 1..=3 {
        let msg = ops
            .create_message(room.room_id, owner.user_id, format!("message {i}"), vec![], vec![])
            .await
            .expect("create");
        assert_eq!(msg.seq_no, i);
        assert_eq!(msg.author_name.as_deref(), Some("Alice"));
    }

    let fetched = ops.get_room(room.room_id, owner.user_id).await.expect("room");
    assert_eq!(fetched.last_message_seq, 3);
    assert!(fetched.last_message_at.is_some());
}

#[tokio::test]
async fn concurrent_writers_never_skip_or_duplicate_a_sequence() {
    let (ops, _, owner, room) = setup().await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let ops = ops.clone();
        let room_id = room.room_id;
        let author = owner.user_id;
        handles.push(tokio::spawn(async move {
            ops.create_message(room_id, author, format!("concurrent {i}"), vec![], vec![]).await
        }));
    }

    let mut seqs = Vec::new();
    for handle in handles {
        let msg = handle.await.expect("join").expect("create");
        seqs.push(msg.seq_no);
    }

    seqs.sort_unstable();
    assert_eq!(seqs, (1..=10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn pagination_walks_backward_without_overlap_or_gap() {
    let (ops, _, owner, room) = setup().await;

    for i in 1..=25 {
        ops.create_message(room.room_id, owner.user_id, format!("m{i}"), vec![], vec![])
            .await
            .expect("create");
    }

    let mut collected = Vec::new();
    let mut before = None;
    loop {
        let page = ops
            .get_messages(room.room_id, owner.user_id, before, Some(10))
            .await
            .expect("page");

        // Each page arrives oldest first.
        let seqs: Vec<i64> = page.messages.iter().map(|m| m.seq_no).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted);

        before = page.messages.first().map(|m| m.seq_no);
        collected.extend(seqs);
        if !page.has_more {
            break;
        }
    }

    collected.sort_unstable();
    assert_eq!(collected, (1..=25).collect::<Vec<i64>>());
}

#[tokio::test]
async fn deleted_messages_vanish_but_keep_their_position() {
    let (ops, _, owner, room) = setup().await;

    let mut ids = Vec::new();
    for i in 1..=3 {
        let msg = ops
            .create_message(room.room_id, owner.user_id, format!("m{i}"), vec![], vec![])
            .await
            .expect("create");
        ids.push(msg.message_id);
    }

    ops.delete_message(ids[1], owner.user_id).await.expect("delete");

    let page = ops.get_messages(room.room_id, owner.user_id, None, None).await.expect("page");
    let seqs: Vec<i64> = page.messages.iter().map(|m| m.seq_no).collect();
    assert_eq!(seqs, vec![1, 3]);

    // The freed position is never reused.
    let next = ops
        .create_message(room.room_id, owner.user_id, "m4".to_string(), vec![], vec![])
        .await
        .expect("create");
    assert_eq!(next.seq_no, 4);
}

#[tokio::test]
async fn delete_is_not_repeatable() {
    let (ops, _, owner, room) = setup().await;
    let msg = ops
        .create_message(room.room_id, owner.user_id, "gone".to_string(), vec![], vec![])
        .await
        .expect("create");

    ops.delete_message(msg.message_id, owner.user_id).await.expect("first delete");
    let err = ops.delete_message(msg.message_id, owner.user_id).await.expect_err("second");
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete() {
    let (ops, users, owner, room) = setup().await;
    let bob = join_user(&ops, &users, &room, owner.user_id, "Bob", "bob@example.com").await;

    let msg = ops
        .create_message(room.room_id, owner.user_id, "original".to_string(), vec![], vec![])
        .await
        .expect("create");

    let err = ops
        .edit_message(msg.message_id, bob.user_id, "hijacked".to_string())
        .await
        .expect_err("edit");
    assert!(matches!(err, RepositoryError::AccessDenied { .. }));

    let err = ops.delete_message(msg.message_id, bob.user_id).await.expect_err("delete");
    assert!(matches!(err, RepositoryError::AccessDenied { .. }));

    let edited = ops
        .edit_message(msg.message_id, owner.user_id, "fixed".to_string())
        .await
        .expect("edit");
    assert_eq!(edited.content, "fixed");
    assert!(edited.edited);
    assert_eq!(edited.seq_no, msg.seq_no);
}

#[tokio::test]
async fn non_members_are_rejected() {
    let (ops, users, _, room) = setup().await;
    let stranger = users
        .create(&User::new("Mallory".to_string(), "mallory@example.com".to_string()))
        .await
        .expect("user");

    let err = ops
        .create_message(room.room_id, stranger.user_id, "hi".to_string(), vec![], vec![])
        .await
        .expect_err("create");
    assert!(matches!(err, RepositoryError::AccessDenied { .. }));

    let err = ops
        .get_messages(room.room_id, stranger.user_id, None, None)
        .await
        .expect_err("read");
    assert!(matches!(err, RepositoryError::AccessDenied { .. }));
}

#[tokio::test]
async fn one_reaction_per_user_and_emoji() {
    let (ops, users, owner, room) = setup().await;
    let bob = join_user(&ops, &users, &room, owner.user_id, "Bob", "bob@example.com").await;

    let msg = ops
        .create_message(room.room_id, owner.user_id, "react to me".to_string(), vec![], vec![])
        .await
        .expect("create");

    ops.add_reaction(msg.message_id, owner.user_id, "👍".to_string()).await.expect("first");

    let err = ops
        .add_reaction(msg.message_id, owner.user_id, "👍".to_string())
        .await
        .expect_err("duplicate");
    assert!(matches!(err, RepositoryError::DuplicateReaction { .. }));

    let updated = ops
        .add_reaction(msg.message_id, bob.user_id, "👍".to_string())
        .await
        .expect("second user");
    let metadata = updated.metadata.expect("metadata");
    assert_eq!(metadata.reactions.len(), 1);
    assert_eq!(metadata.reactions[0].count, 2);

    // A different emoji opens a fresh bucket.
    let updated = ops
        .add_reaction(msg.message_id, bob.user_id, "🎉".to_string())
        .await
        .expect("new emoji");
    let metadata = updated.metadata.expect("metadata");
    assert_eq!(metadata.reactions.len(), 2);
    let party = metadata.reactions.iter().find(|r| r.emoji == "🎉").expect("bucket");
    assert_eq!(party.count, 1);
}

#[tokio::test]
async fn two_authors_interleave_in_commit_order() {
    let (ops, users, owner, room) = setup().await;
    let bob = join_user(&ops, &users, &room, owner.user_id, "Bob", "bob@example.com").await;
    // The join itself is seq 1 as a system event.

    let hello = ops
        .create_message(room.room_id, owner.user_id, "hello".to_string(), vec![], vec![])
        .await
        .expect("hello");
    let hi = ops
        .create_message(room.room_id, bob.user_id, "hi".to_string(), vec![], vec![])
        .await
        .expect("hi");
    assert_eq!(hello.seq_no + 1, hi.seq_no);

    let page = ops
        .get_messages(room.room_id, bob.user_id, None, Some(10))
        .await
        .expect("page");
    let contents: Vec<&str> =
        page.messages.iter().skip(1).map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hello", "hi"]);

    let previous = ops
        .get_messages(room.room_id, owner.user_id, Some(hi.seq_no), Some(1))
        .await
        .expect("page before hi");
    assert_eq!(previous.messages.len(), 1);
    assert_eq!(previous.messages[0].content, "hello");
}

#[tokio::test]
async fn read_cursor_only_moves_forward() {
    let (ops, _, owner, room) = setup().await;

    for i in 1..=5 {
        ops.create_message(room.room_id, owner.user_id, format!("m{i}"), vec![], vec![])
            .await
            .expect("create");
    }

    let p = ops.mark_read(room.room_id, owner.user_id, 5).await.expect("advance");
    assert_eq!(p.last_read_seq_no, 5);
    assert!(p.last_viewed_at.is_some());

    // A stale position is a silent no-op.
    let p = ops.mark_read(room.room_id, owner.user_id, 3).await.expect("stale");
    assert_eq!(p.last_read_seq_no, 5);

    assert_eq!(ops.unread_count(room.room_id, owner.user_id).await.expect("unread"), 0);
}

#[tokio::test]
async fn unread_count_skips_deleted_messages() {
    let (ops, _, owner, room) = setup().await;

    let mut ids = Vec::new();
    for i in 1..=4 {
        let msg = ops
            .create_message(room.room_id, owner.user_id, format!("m{i}"), vec![], vec![])
            .await
            .expect("create");
        ids.push(msg.message_id);
    }

    ops.mark_read(room.room_id, owner.user_id, 1).await.expect("cursor");
    assert_eq!(ops.unread_count(room.room_id, owner.user_id).await.expect("unread"), 3);

    ops.delete_message(ids[2], owner.user_id).await.expect("delete");
    assert_eq!(ops.unread_count(room.room_id, owner.user_id).await.expect("unread"), 2);
}

#[tokio::test]
async fn transcript_webhook_appends_once_per_session() {
    let (ops, _, owner, room) = setup().await;

    let first = ops
        .ingest_transcript(transcript_notification(&room.room_name, 9))
        .await
        .expect("ingest");
    assert_eq!(first.message_type, MessageType::MeetingTranscript);
    assert_eq!(first.content, "Meeting transcript is available.");
    assert!(first.author_id.is_none());
    let transcript = first.extra_data.as_ref().and_then(|e| e.transcript.as_ref()).expect("data");
    assert_eq!(transcript.bucket, "meeting-transcripts");

    // A retried delivery for the same session window is deduplicated.
    let second = ops
        .ingest_transcript(transcript_notification(&room.room_name, 9))
        .await
        .expect("retry");
    assert_eq!(second.message_id, first.message_id);

    // A different session window is a new log entry.
    let third = ops
        .ingest_transcript(transcript_notification(&room.room_name, 14))
        .await
        .expect("new session");
    assert_ne!(third.message_id, first.message_id);

    let page = ops.get_messages(room.room_id, owner.user_id, None, None).await.expect("page");
    assert_eq!(page.messages.len(), 2);
}

#[tokio::test]
async fn transcript_webhook_for_unknown_room_is_not_found() {
    let (ops, _, _, _) = setup().await;
    let err = ops
        .ingest_transcript(transcript_notification("no-such-room", 9))
        .await
        .expect_err("ingest");
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn attachments_bind_once_and_survive_bad_ids() {
    let (ops, _, owner, room) = setup().await;

    let orphan = Attachment {
        attachment_id: Uuid::new_v4(),
        message_id: None,
        room_id: room.room_id,
        file_name: "notes.pdf".to_string(),
        file_type: "application/pdf".to_string(),
        file_size: 2048,
        storage_key: format!("{}/notes.pdf", room.room_id),
        storage_url: "https://cdn.example.com/notes.pdf".to_string(),
        created_at: Utc::now(),
    };
    ops.register_attachment(room.room_id, owner.user_id, orphan.clone())
        .await
        .expect("register");

    // A bogus attachment id must not fail the message itself.
    let msg = ops
        .create_message(
            room.room_id,
            owner.user_id,
            "with file".to_string(),
            vec![],
            vec![orphan.attachment_id, Uuid::new_v4()],
        )
        .await
        .expect("create");
    assert_eq!(msg.attachments.len(), 1);
    assert_eq!(msg.attachments[0].message_id, Some(msg.message_id));

    // Binding the same attachment to a second message is refused, and the
    // second message still commits.
    let other = ops
        .create_message(
            room.room_id,
            owner.user_id,
            "steal the file".to_string(),
            vec![],
            vec![orphan.attachment_id],
        )
        .await
        .expect("create");
    assert!(other.attachments.is_empty());

    let hydrated = ops.get_message(msg.message_id, owner.user_id).await.expect("get");
    assert_eq!(hydrated.attachments.len(), 1);
}

#[tokio::test]
async fn search_is_scoped_to_the_room_and_live_messages() {
    let (ops, _, owner, room) = setup().await;

    ops.create_message(room.room_id, owner.user_id, "deploy plan for friday".to_string(), vec![], vec![])
        .await
        .expect("create");
    let doomed = ops
        .create_message(room.room_id, owner.user_id, "deploy rollback".to_string(), vec![], vec![])
        .await
        .expect("create");
    ops.create_message(room.room_id, owner.user_id, "lunch options".to_string(), vec![], vec![])
        .await
        .expect("create");
    ops.delete_message(doomed.message_id, owner.user_id).await.expect("delete");

    let hits = ops
        .search_messages(room.room_id, owner.user_id, "deploy", None)
        .await
        .expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "deploy plan for friday");
}

#[tokio::test]
async fn joins_and_departures_land_in_the_log() {
    let (ops, users, owner, room) = setup().await;
    join_user(&ops, &users, &room, owner.user_id, "Bob", "bob@example.com").await;

    let page = ops.get_messages(room.room_id, owner.user_id, None, None).await.expect("page");
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].message_type, MessageType::SystemEvent);
    assert_eq!(page.messages[0].content, "Bob joined the room");
    assert_eq!(page.messages[0].seq_no, 1);

    let participants =
        ops.list_participants(room.room_id, owner.user_id).await.expect("participants");
    let bob = participants.iter().find(|p| p.name == "Bob").expect("bob");
    ops.remove_participant(room.room_id, bob.participant_id, owner.user_id)
        .await
        .expect("remove");

    let page = ops.get_messages(room.room_id, owner.user_id, None, None).await.expect("page");
    assert_eq!(page.messages.last().map(|m| m.content.as_str()), Some("Bob left the room"));
}

#[tokio::test]
async fn empty_and_oversize_content_never_reach_the_log() {
    let (ops, _, owner, room) = setup().await;

    let err = ops
        .create_message(room.room_id, owner.user_id, String::new(), vec![], vec![])
        .await
        .expect_err("empty");
    assert!(matches!(err, RepositoryError::Validation { .. }));

    let err = ops
        .create_message(room.room_id, owner.user_id, "x".repeat(5001), vec![], vec![])
        .await
        .expect_err("oversize");
    assert!(matches!(err, RepositoryError::Validation { .. }));

    let fetched = ops.get_room(room.room_id, owner.user_id).await.expect("room");
    assert_eq!(fetched.last_message_seq, 0);
}

#[tokio::test]
async fn inactive_rooms_reject_new_messages() {
    let (ops, _, owner, room) = setup().await;
    ops.delete_room(room.room_id, owner.user_id).await.expect("deactivate");

    let err = ops
        .create_message(room.room_id, owner.user_id, "too late".to_string(), vec![], vec![])
        .await
        .expect_err("create");
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}
