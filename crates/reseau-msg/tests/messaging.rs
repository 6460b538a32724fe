//! End-to-end scenarios for the messaging engine over a real on-disk store.

use std::sync::Arc;

use chrono::Utc;

use reseau_graph::ConnectionGraphEngine;
use reseau_msg::{MessagingEngine, MsgError};
use reseau_shared::{GraphPolicy, MessagePolicy, MessageStatus, UserId};
use reseau_store::{Database, User, UserDirectory};

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

fn setup(
    users: &[&str],
    policy: MessagePolicy,
) -> (tempfile::TempDir, MessagingEngine, Arc<ConnectionGraphEngine>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open_at(&dir.path().join("test.db")).unwrap());
    for id in users {
        db.create_user(&User {
            id: uid(id),
            display_name: Some(id.to_string()),
            email: None,
            created_at: Utc::now(),
        })
        .unwrap();
    }
    let directory: Arc<dyn UserDirectory> = db.clone();
    let graph = Arc::new(ConnectionGraphEngine::new(
        db.clone(),
        directory.clone(),
        GraphPolicy::default(),
    ));
    let engine = MessagingEngine::new(db, directory, graph.clone(), policy);
    (dir, engine, graph)
}

#[test]
fn send_read_round_trip() {
    let (_dir, engine, _) = setup(&["alice", "bob"], MessagePolicy::default());

    let id = engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();

    let content = engine.read_message(&uid("bob"), id).unwrap();
    assert_eq!(content, "hi");

    // Read is sticky and repeatable.
    assert_eq!(engine.read_message(&uid("bob"), id).unwrap(), "hi");
    let inbox = engine.list_inbox(&uid("bob")).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].status, MessageStatus::Read);
    assert!(engine.list_unread(&uid("bob")).unwrap().is_empty());
}

#[test]
fn content_is_trimmed_and_must_be_non_empty() {
    let (_dir, engine, _) = setup(&["alice", "bob"], MessagePolicy::default());

    assert!(matches!(
        engine.send_message(&uid("alice"), &uid("bob"), "   \n"),
        Err(MsgError::EmptyContent)
    ));

    let id = engine
        .send_message(&uid("alice"), &uid("bob"), "  padded  ")
        .unwrap();
    assert_eq!(engine.read_message(&uid("bob"), id).unwrap(), "padded");
}

#[test]
fn unknown_receiver_is_not_found() {
    let (_dir, engine, _) = setup(&["alice"], MessagePolicy::default());
    assert!(matches!(
        engine.send_message(&uid("alice"), &uid("ghost"), "hello?"),
        Err(MsgError::NotFound)
    ));
}

#[test]
fn only_the_receiver_may_read() {
    let (_dir, engine, _) = setup(&["alice", "bob", "carol"], MessagePolicy::default());
    let id = engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();

    assert!(matches!(
        engine.read_message(&uid("alice"), id),
        Err(MsgError::Forbidden)
    ));
    assert!(matches!(
        engine.read_message(&uid("carol"), id),
        Err(MsgError::Forbidden)
    ));
}

#[test]
fn inbox_and_sent_are_newest_first_with_distinct_timestamps() {
    let (_dir, engine, _) = setup(&["alice", "bob"], MessagePolicy::default());
    for body in ["one", "two", "three"] {
        engine.send_message(&uid("alice"), &uid("bob"), body).unwrap();
    }

    let inbox = engine.list_inbox(&uid("bob")).unwrap();
    assert_eq!(inbox.len(), 3);
    assert_eq!(inbox[0].content, "three");
    assert_eq!(inbox[2].content, "one");
    // Per-sender monotonic clock: strictly decreasing going down the inbox.
    assert!(inbox[0].sent_at > inbox[1].sent_at);
    assert!(inbox[1].sent_at > inbox[2].sent_at);

    let sent = engine.list_sent(&uid("alice")).unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].content, "three");
}

#[test]
fn deletion_is_scoped_to_the_deleting_viewer() {
    let (_dir, engine, _) = setup(&["alice", "bob"], MessagePolicy::default());
    let id = engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();

    engine.delete_message(&uid("alice"), id).unwrap();

    // Gone for alice, still there for bob.
    assert!(engine.list_sent(&uid("alice")).unwrap().is_empty());
    let inbox = engine.list_inbox(&uid("bob")).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(engine.read_message(&uid("bob"), id).unwrap(), "hi");

    // Once bob deletes too, the row is purged for good.
    engine.delete_message(&uid("bob"), id).unwrap();
    assert!(engine.list_inbox(&uid("bob")).unwrap().is_empty());
    assert!(matches!(
        engine.read_message(&uid("bob"), id),
        Err(MsgError::NotFound)
    ));
}

#[test]
fn receiver_side_delete_hides_from_reads() {
    let (_dir, engine, _) = setup(&["alice", "bob"], MessagePolicy::default());
    let id = engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();

    engine.delete_message(&uid("bob"), id).unwrap();
    assert!(matches!(
        engine.read_message(&uid("bob"), id),
        Err(MsgError::NotFound)
    ));
    // The sender still sees it in their outbox.
    assert_eq!(engine.list_sent(&uid("alice")).unwrap().len(), 1);
}

#[test]
fn third_parties_cannot_delete() {
    let (_dir, engine, _) = setup(&["alice", "bob", "carol"], MessagePolicy::default());
    let id = engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();

    assert!(matches!(
        engine.delete_message(&uid("carol"), id),
        Err(MsgError::Forbidden)
    ));
}

#[test]
fn friendship_gate_blocks_strangers_when_enabled() {
    let policy = MessagePolicy {
        require_friendship: true,
    };
    let (_dir, engine, graph) = setup(&["alice", "bob"], policy);

    assert!(matches!(
        engine.send_message(&uid("alice"), &uid("bob"), "hi"),
        Err(MsgError::Forbidden)
    ));

    graph.send_request(&uid("alice"), &uid("bob")).unwrap();
    graph
        .respond_to_request(&uid("bob"), &uid("alice"), true)
        .unwrap();

    engine.send_message(&uid("alice"), &uid("bob"), "hi").unwrap();
}
