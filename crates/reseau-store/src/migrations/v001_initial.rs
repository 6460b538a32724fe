//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `connections`, `messages`, and
//! `message_deletions`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
///
/// `users` backs the in-process user directory.  The engines reference user
/// ids but deliberately carry no foreign keys to `users`: deployments that
/// plug in an external directory keep the same schema.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (directory backing table)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,
    display_name TEXT,
    email        TEXT,
    created_at   TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Connections (mirrored directed edge rows)
--
-- A logical friendship between A and B is two rows, (A,B) and (B,A),
-- written in one transaction and always carrying the same status.
-- `requested_by` records which side sent the original request so the
-- pending direction is unambiguous.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS connections (
    owner_id     TEXT NOT NULL,
    peer_id      TEXT NOT NULL,
    status       TEXT NOT NULL,               -- pending | accepted | rejected
    requested_by TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,

    PRIMARY KEY (owner_id, peer_id)
);

CREATE INDEX IF NOT EXISTS idx_connections_owner_status
    ON connections(owner_id, status);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    sender_id   TEXT NOT NULL,
    receiver_id TEXT NOT NULL,
    content     TEXT NOT NULL,
    status      TEXT NOT NULL,                -- delivered | read
    sent_at     TEXT NOT NULL                 -- RFC-3339, fixed precision
);

CREATE INDEX IF NOT EXISTS idx_messages_receiver_ts
    ON messages(receiver_id, sent_at DESC);

CREATE INDEX IF NOT EXISTS idx_messages_sender_ts
    ON messages(sender_id, sent_at DESC);

-- ----------------------------------------------------------------
-- Per-viewer message deletions
--
-- A row here means `viewer_id` has deleted `message_id` from their own
-- view.  The physical message is purged once both parties appear.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS message_deletions (
    message_id TEXT NOT NULL,
    viewer_id  TEXT NOT NULL,
    deleted_at TEXT NOT NULL,

    PRIMARY KEY (message_id, viewer_id),
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
