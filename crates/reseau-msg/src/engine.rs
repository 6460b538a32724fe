//! The messaging engine.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use reseau_graph::ConnectionGraphEngine;
use reseau_shared::{MessagePolicy, MessageStatus, UserId};
use reseau_store::{Database, Message, StoreError, UserDirectory};

use crate::error::{MsgError, Result};

/// Creates, delivers, and retires messages.
///
/// The engine consults the connection graph engine only when the policy
/// gates sending on an accepted connection; otherwise any directory user may
/// message any other.
pub struct MessagingEngine {
    db: Arc<Database>,
    directory: Arc<dyn UserDirectory>,
    graph: Arc<ConnectionGraphEngine>,
    policy: MessagePolicy,
}

impl MessagingEngine {
    pub fn new(
        db: Arc<Database>,
        directory: Arc<dyn UserDirectory>,
        graph: Arc<ConnectionGraphEngine>,
        policy: MessagePolicy,
    ) -> Self {
        Self {
            db,
            directory,
            graph,
            policy,
        }
    }

    /// Send a message and return its id.
    ///
    /// The timestamp is the server clock, clamped strictly above the
    /// sender's previous `sent_at` so inbox ordering stays stable even when
    /// the same sender writes twice within clock resolution.
    pub fn send_message(&self, sender: &UserId, receiver: &UserId, content: &str) -> Result<Uuid> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MsgError::EmptyContent);
        }
        if !self.directory.exists(receiver)? {
            return Err(MsgError::NotFound);
        }
        if self.policy.require_friendship && !self.graph.list_friends(sender)?.contains(receiver) {
            return Err(MsgError::Forbidden);
        }

        let now = Utc::now();
        let sent_at = match self.db.latest_sent_at(sender)? {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };

        let message = Message {
            id: Uuid::new_v4(),
            sender: sender.clone(),
            receiver: receiver.clone(),
            content: content.to_string(),
            status: MessageStatus::Delivered,
            sent_at,
        };
        self.db.insert_message(&message)?;

        tracing::debug!(id = %message.id, sender = %sender, receiver = %receiver, "message sent");
        Ok(message.id)
    }

    /// Messages addressed to `user`, newest first, excluding ones they
    /// deleted.
    pub fn list_inbox(&self, user: &UserId) -> Result<Vec<Message>> {
        Ok(self.db.list_by_receiver(user)?)
    }

    /// Unread subset of the inbox.
    pub fn list_unread(&self, user: &UserId) -> Result<Vec<Message>> {
        Ok(self.db.list_unread(user)?)
    }

    /// Messages sent by `user`, newest first, excluding ones they deleted.
    pub fn list_sent(&self, user: &UserId) -> Result<Vec<Message>> {
        Ok(self.db.list_by_sender(user)?)
    }

    /// Return the message body and mark it read.  Receiver-only; reading an
    /// already-read message is a no-op that still returns the content.
    pub fn read_message(&self, user: &UserId, id: Uuid) -> Result<String> {
        let message = self.db.get_message(id)?.ok_or(MsgError::NotFound)?;
        if message.receiver != *user {
            return Err(MsgError::Forbidden);
        }
        if self.db.is_deleted_for(id, user)? {
            return Err(MsgError::NotFound);
        }

        if message.status == MessageStatus::Delivered {
            self.db.mark_read(id)?;
        }
        Ok(message.content)
    }

    /// Delete the message from `user`'s view.  Sender and receiver each hold
    /// their own view; the physical row is purged only once both have
    /// deleted it.
    pub fn delete_message(&self, user: &UserId, id: Uuid) -> Result<()> {
        let message = self.db.get_message(id)?.ok_or(MsgError::NotFound)?;
        if message.sender != *user && message.receiver != *user {
            return Err(MsgError::Forbidden);
        }

        let purged = self
            .db
            .mark_deleted_for_viewer(id, user)
            .map_err(|e| match e {
                StoreError::NotFound => MsgError::NotFound,
                other => MsgError::Store(other),
            })?;
        if purged {
            tracing::debug!(id = %id, "message purged after both parties deleted it");
        }
        Ok(())
    }
}
