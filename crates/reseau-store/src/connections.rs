//! Edge-pair operations for the connection graph.
//!
//! A logical friendship (or pending request) is two mirrored rows.  Every
//! mutation here touches both rows inside one transaction; if the two rows
//! ever disagree on how many were affected the transaction rolls back with
//! [`StoreError::MirrorMismatch`].

use chrono::{DateTime, Utc};
use rusqlite::params;

use reseau_shared::{ConnectionStatus, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Connection;

impl Database {
    // ------------------------------------------------------------------
    // Point reads
    // ------------------------------------------------------------------

    /// Fetch the directed edge row `(owner, peer)`, if any.
    pub fn get_edge(&self, owner: &UserId, peer: &UserId) -> Result<Option<Connection>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT owner_id, peer_id, status, requested_by, created_at, updated_at
                     FROM connections
                     WHERE owner_id = ?1 AND peer_id = ?2",
                    params![owner.as_str(), peer.as_str()],
                    row_to_connection,
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(StoreError::from(other)),
                })?;
            Ok(row)
        })
    }

    // ------------------------------------------------------------------
    // Pair mutations (transactional)
    // ------------------------------------------------------------------

    /// Insert (or replace) the mirrored edge pair between `a` and `b`.
    ///
    /// Replacing is what allows a rejected pair to be re-requested: the old
    /// rows are overwritten with a fresh pair in the same statement.
    pub fn put_edge_pair(
        &self,
        a: &UserId,
        b: &UserId,
        status: ConnectionStatus,
        requested_by: &UserId,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.with_tx(|tx| {
            for (owner, peer) in [(a, b), (b, a)] {
                tx.execute(
                    "INSERT OR REPLACE INTO connections
                         (owner_id, peer_id, status, requested_by, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        owner.as_str(),
                        peer.as_str(),
                        status.as_str(),
                        requested_by.as_str(),
                        now,
                    ],
                )?;
            }
            Ok(())
        })
    }

    /// Flip a pending pair requested by `requester` toward `responder` to
    /// `status`.  Returns `false` when no such pending pair exists, without
    /// touching anything.
    pub fn update_pending_pair(
        &self,
        requester: &UserId,
        responder: &UserId,
        status: ConnectionStatus,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        self.with_tx(|tx| {
            let mut affected = [0usize; 2];
            for (i, (owner, peer)) in [(requester, responder), (responder, requester)]
                .into_iter()
                .enumerate()
            {
                affected[i] = tx.execute(
                    "UPDATE connections
                     SET status = ?1, updated_at = ?2
                     WHERE owner_id = ?3 AND peer_id = ?4
                       AND status = 'pending' AND requested_by = ?5",
                    params![
                        status.as_str(),
                        now,
                        owner.as_str(),
                        peer.as_str(),
                        requester.as_str(),
                    ],
                )?;
            }
            match affected {
                [1, 1] => Ok(true),
                [0, 0] => Ok(false),
                _ => Err(StoreError::MirrorMismatch(
                    requester.to_string(),
                    responder.to_string(),
                )),
            }
        })
    }

    /// Delete the edge pair between `a` and `b` if its status matches
    /// `expected`.  Returns `false` when no matching pair exists.
    pub fn delete_edge_pair(
        &self,
        a: &UserId,
        b: &UserId,
        expected: ConnectionStatus,
    ) -> Result<bool> {
        self.with_tx(|tx| {
            let mut affected = [0usize; 2];
            for (i, (owner, peer)) in [(a, b), (b, a)].into_iter().enumerate() {
                affected[i] = tx.execute(
                    "DELETE FROM connections
                     WHERE owner_id = ?1 AND peer_id = ?2 AND status = ?3",
                    params![owner.as_str(), peer.as_str(), expected.as_str()],
                )?;
            }
            match affected {
                [1, 1] => Ok(true),
                [0, 0] => Ok(false),
                _ => Err(StoreError::MirrorMismatch(a.to_string(), b.to_string())),
            }
        })
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// List the edges owned by `owner`, optionally filtered by status,
    /// ordered by peer id so repeated calls are stable.
    pub fn list_edges_by_owner(
        &self,
        owner: &UserId,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<Connection>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT owner_id, peer_id, status, requested_by, created_at, updated_at
                 FROM connections
                 WHERE owner_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY peer_id ASC",
            )?;

            let rows = stmt.query_map(
                params![owner.as_str(), status.map(|s| s.as_str())],
                row_to_connection,
            )?;

            let mut edges = Vec::new();
            for row in rows {
                edges.push(row?);
            }
            Ok(edges)
        })
    }

    /// Peers with an accepted edge to `owner`, ordered by id.
    pub fn accepted_peers(&self, owner: &UserId) -> Result<Vec<UserId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT peer_id FROM connections
                 WHERE owner_id = ?1 AND status = 'accepted'
                 ORDER BY peer_id ASC",
            )?;

            let rows = stmt.query_map(params![owner.as_str()], |row| {
                row.get::<_, String>(0).map(UserId::new)
            })?;

            let mut peers = Vec::new();
            for row in rows {
                peers.push(row?);
            }
            Ok(peers)
        })
    }

    /// Number of accepted edges owned by `owner`.
    pub fn accepted_degree(&self, owner: &UserId) -> Result<u32> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT count(*) FROM connections
                 WHERE owner_id = ?1 AND status = 'accepted'",
                params![owner.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Peers whose friend request is waiting on `owner`'s answer.
    ///
    /// On the `(owner, peer)` row a request *received* by `owner` has
    /// `requested_by = peer_id`; rows the owner sent themselves are excluded.
    pub fn pending_requests_for(&self, owner: &UserId) -> Result<Vec<UserId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT peer_id FROM connections
                 WHERE owner_id = ?1 AND status = 'pending' AND requested_by = peer_id
                 ORDER BY peer_id ASC",
            )?;

            let rows = stmt.query_map(params![owner.as_str()], |row| {
                row.get::<_, String>(0).map(UserId::new)
            })?;

            let mut peers = Vec::new();
            for row in rows {
                peers.push(row?);
            }
            Ok(peers)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Connection`].
fn row_to_connection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Connection> {
    let owner: String = row.get(0)?;
    let peer: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let requested_by: String = row.get(3)?;
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    let status = ConnectionStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown connection status: {status_str}").into(),
        )
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Connection {
        owner: UserId::new(owner),
        peer: UserId::new(peer),
        status,
        requested_by: UserId::new(requested_by),
        created_at,
        updated_at,
    })
}
