//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a host process over IPC or RPC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reseau_shared::{ConnectionStatus, MessageStatus, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A directory entry.  The engines only ever ask whether an id exists; the
/// rest of the record is plain profile data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique, immutable user id.
    pub id: UserId,
    /// Optional human-readable display name.
    pub display_name: Option<String>,
    /// Optional contact email.
    pub email: Option<String>,
    /// When this user was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// One directed row of a mirrored edge pair.
///
/// The pair `(owner, peer)` / `(peer, owner)` always exists as a whole and
/// both rows carry the same status; `requested_by` names the side that sent
/// the original friend request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    /// The user from whose view this row is read.
    pub owner: UserId,
    /// The user on the other end of the edge.
    pub peer: UserId,
    /// Shared status of the pair.
    pub status: ConnectionStatus,
    /// Which of the two users initiated the request.
    pub requested_by: UserId,
    /// When the pair was created.
    pub created_at: DateTime<Utc>,
    /// When the pair last changed status.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single direct message.  Deletion is tracked per viewer in a separate
/// table, so the struct itself has no delete flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// Who sent the message.
    pub sender: UserId,
    /// Who it is addressed to.
    pub receiver: UserId,
    /// Plain message body.
    pub content: String,
    /// Delivered until the receiver reads it, then Read.
    pub status: MessageStatus,
    /// Server timestamp, strictly increasing per sender.
    pub sent_at: DateTime<Utc>,
}
