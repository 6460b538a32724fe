//! Message records and the per-viewer deletion set.
//!
//! Deleting a message only hides it from the viewer who deleted it.  The
//! physical row is purged, together with its deletion marks, once both the
//! sender and the receiver have deleted it; the mark and the purge happen in
//! the same transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use uuid::Uuid;

use reseau_shared::{MessageStatus, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;

impl Database {
    /// Insert a new message.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, status, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.to_string(),
                    message.sender.as_str(),
                    message.receiver.as_str(),
                    message.content,
                    message.status.as_str(),
                    encode_sent_at(&message.sent_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Fetch a single message by id, if it still physically exists.
    pub fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, sender_id, receiver_id, content, status, sent_at
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::from(other)),
            })
        })
    }

    /// Transition a message to `Read`.  Idempotent.
    pub fn mark_read(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET status = 'read' WHERE id = ?1",
                params![id.to_string()],
            )?;
            Ok(())
        })
    }

    /// The most recent `sent_at` recorded for this sender, used to keep the
    /// per-sender clock monotonic under concurrent sends.
    pub fn latest_sent_at(&self, sender: &UserId) -> Result<Option<DateTime<Utc>>> {
        self.with_conn(|conn| {
            let max: Option<String> = conn.query_row(
                "SELECT max(sent_at) FROM messages WHERE sender_id = ?1",
                params![sender.as_str()],
                |row| row.get(0),
            )?;

            max.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(StoreError::ChronoParse)
            })
            .transpose()
        })
    }

    /// Whether `viewer` has deleted this message from their own view.
    pub fn is_deleted_for(&self, id: Uuid, viewer: &UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT count(*) FROM message_deletions
                 WHERE message_id = ?1 AND viewer_id = ?2",
                params![id.to_string(), viewer.as_str()],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Record that `viewer` deleted the message.  When both parties have
    /// deleted it the physical row is purged in the same transaction.
    ///
    /// Returns `true` when the purge happened.  `StoreError::NotFound` if the
    /// message no longer exists.
    pub fn mark_deleted_for_viewer(&self, id: Uuid, viewer: &UserId) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        self.with_tx(|tx| {
            let (sender, receiver): (String, String) = tx
                .query_row(
                    "SELECT sender_id, receiver_id FROM messages WHERE id = ?1",
                    params![id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                    other => other.into(),
                })?;

            tx.execute(
                "INSERT OR IGNORE INTO message_deletions (message_id, viewer_id, deleted_at)
                 VALUES (?1, ?2, ?3)",
                params![id.to_string(), viewer.as_str(), now],
            )?;

            let deleters: u32 = tx.query_row(
                "SELECT count(*) FROM message_deletions
                 WHERE message_id = ?1 AND viewer_id IN (?2, ?3)",
                params![id.to_string(), sender, receiver],
                |row| row.get(0),
            )?;

            // A self-addressed message has only one party to wait for.
            let required = if sender == receiver { 1 } else { 2 };
            if deleters >= required {
                tx.execute(
                    "DELETE FROM messages WHERE id = ?1",
                    params![id.to_string()],
                )?;
                // message_deletions rows go with it (ON DELETE CASCADE).
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }

    /// Messages addressed to `receiver` that they have not deleted, newest
    /// first.
    pub fn list_by_receiver(&self, receiver: &UserId) -> Result<Vec<Message>> {
        self.list_visible(
            "SELECT m.id, m.sender_id, m.receiver_id, m.content, m.status, m.sent_at
             FROM messages m
             WHERE m.receiver_id = ?1
               AND NOT EXISTS (SELECT 1 FROM message_deletions d
                               WHERE d.message_id = m.id AND d.viewer_id = ?1)
             ORDER BY m.sent_at DESC, m.id ASC",
            receiver,
        )
    }

    /// Like [`Database::list_by_receiver`] but restricted to messages not yet
    /// read.
    pub fn list_unread(&self, receiver: &UserId) -> Result<Vec<Message>> {
        self.list_visible(
            "SELECT m.id, m.sender_id, m.receiver_id, m.content, m.status, m.sent_at
             FROM messages m
             WHERE m.receiver_id = ?1 AND m.status = 'delivered'
               AND NOT EXISTS (SELECT 1 FROM message_deletions d
                               WHERE d.message_id = m.id AND d.viewer_id = ?1)
             ORDER BY m.sent_at DESC, m.id ASC",
            receiver,
        )
    }

    /// Messages sent by `sender` that they have not deleted, newest first.
    pub fn list_by_sender(&self, sender: &UserId) -> Result<Vec<Message>> {
        self.list_visible(
            "SELECT m.id, m.sender_id, m.receiver_id, m.content, m.status, m.sent_at
             FROM messages m
             WHERE m.sender_id = ?1
               AND NOT EXISTS (SELECT 1 FROM message_deletions d
                               WHERE d.message_id = m.id AND d.viewer_id = ?1)
             ORDER BY m.sent_at DESC, m.id ASC",
            sender,
        )
    }

    fn list_visible(&self, sql: &str, viewer: &UserId) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![viewer.as_str()], row_to_message)?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fixed-precision RFC-3339 so the TEXT column sorts chronologically.
fn encode_sent_at(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender: String = row.get(1)?;
    let receiver: String = row.get(2)?;
    let content: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let sent_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status = MessageStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown message status: {status_str}").into(),
        )
    })?;

    let sent_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&sent_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id,
        sender: UserId::new(sender),
        receiver: UserId::new(receiver),
        content,
        status,
        sent_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn msg(sender: &str, receiver: &str, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender: UserId::from(sender),
            receiver: UserId::from(receiver),
            content: content.to_string(),
            status: MessageStatus::Delivered,
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let (_dir, db) = test_db();
        let m = msg("alice", "bob", "hello");
        db.insert_message(&m).unwrap();

        let fetched = db.get_message(m.id).unwrap().unwrap();
        assert_eq!(fetched.content, "hello");
        assert_eq!(fetched.status, MessageStatus::Delivered);
        assert_eq!(fetched.sender, m.sender);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let (_dir, db) = test_db();
        let m = msg("alice", "bob", "hi");
        db.insert_message(&m).unwrap();

        db.mark_read(m.id).unwrap();
        db.mark_read(m.id).unwrap();
        assert_eq!(
            db.get_message(m.id).unwrap().unwrap().status,
            MessageStatus::Read
        );
    }

    #[test]
    fn one_sided_delete_keeps_the_row() {
        let (_dir, db) = test_db();
        let m = msg("alice", "bob", "hi");
        db.insert_message(&m).unwrap();

        let purged = db.mark_deleted_for_viewer(m.id, &UserId::from("alice")).unwrap();
        assert!(!purged);

        // Hidden from alice, still visible to bob.
        assert!(db.list_by_sender(&UserId::from("alice")).unwrap().is_empty());
        assert_eq!(db.list_by_receiver(&UserId::from("bob")).unwrap().len(), 1);
    }

    #[test]
    fn both_sided_delete_purges() {
        let (_dir, db) = test_db();
        let m = msg("alice", "bob", "hi");
        db.insert_message(&m).unwrap();

        assert!(!db.mark_deleted_for_viewer(m.id, &UserId::from("alice")).unwrap());
        assert!(db.mark_deleted_for_viewer(m.id, &UserId::from("bob")).unwrap());
        assert!(db.get_message(m.id).unwrap().is_none());
    }

    #[test]
    fn deleting_a_purged_message_is_not_found() {
        let (_dir, db) = test_db();
        let m = msg("alice", "bob", "hi");
        db.insert_message(&m).unwrap();
        db.mark_deleted_for_viewer(m.id, &UserId::from("alice")).unwrap();
        db.mark_deleted_for_viewer(m.id, &UserId::from("bob")).unwrap();

        assert!(matches!(
            db.mark_deleted_for_viewer(m.id, &UserId::from("bob")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn latest_sent_at_tracks_the_max() {
        let (_dir, db) = test_db();
        let alice = UserId::from("alice");
        assert!(db.latest_sent_at(&alice).unwrap().is_none());

        // Whole-microsecond timestamps so the TEXT round-trip is lossless.
        let base = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.000000Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut m1 = msg("alice", "bob", "one");
        let mut m2 = msg("alice", "bob", "two");
        m1.sent_at = base;
        m2.sent_at = base + chrono::Duration::microseconds(5);
        db.insert_message(&m1).unwrap();
        db.insert_message(&m2).unwrap();

        let latest = db.latest_sent_at(&alice).unwrap().unwrap();
        assert_eq!(latest, m2.sent_at);
    }

    #[test]
    fn unread_excludes_read_messages() {
        let (_dir, db) = test_db();
        let m1 = msg("alice", "bob", "first");
        let m2 = msg("alice", "bob", "second");
        db.insert_message(&m1).unwrap();
        db.insert_message(&m2).unwrap();
        db.mark_read(m1.id).unwrap();

        let unread = db.list_unread(&UserId::from("bob")).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, m2.id);
    }
}
