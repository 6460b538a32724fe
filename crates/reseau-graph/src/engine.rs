//! The connection graph engine.

use std::sync::Arc;

use reseau_shared::{ConnectionStatus, GraphPolicy, UserId, HOP_CEILING};
use reseau_store::{Database, UserDirectory};

use crate::error::{GraphError, Result};
use crate::traversal;

/// Validates and mutates the friend graph, runs reachability checks, and
/// answers traversal queries.
///
/// The engine holds no mutable state of its own; the store serializes
/// concurrent callers, and all pair mutations run as single transactions.
pub struct ConnectionGraphEngine {
    db: Arc<Database>,
    directory: Arc<dyn UserDirectory>,
    policy: GraphPolicy,
}

impl ConnectionGraphEngine {
    pub fn new(db: Arc<Database>, directory: Arc<dyn UserDirectory>, policy: GraphPolicy) -> Self {
        Self {
            db,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> &GraphPolicy {
        &self.policy
    }

    // ------------------------------------------------------------------
    // Request workflow
    // ------------------------------------------------------------------

    /// Send a friend request from `requester` to `target`.
    ///
    /// The request is permitted when the requester's accepted-degree is
    /// below the policy threshold, or when the target is already reachable
    /// through accepted edges within the eligibility hop bound ("strangers
    /// need an introduction path").  A rejected pair is replaced with a
    /// fresh pending pair when the re-request policy allows it.
    pub fn send_request(&self, requester: &UserId, target: &UserId) -> Result<()> {
        if requester == target {
            return Err(GraphError::SelfRequest);
        }
        if !self.directory.exists(target)? {
            return Err(GraphError::NotFound(target.clone()));
        }

        if let Some(edge) = self.db.get_edge(requester, target)? {
            match edge.status {
                ConnectionStatus::Pending => return Err(GraphError::AlreadyPending),
                ConnectionStatus::Accepted => return Err(GraphError::AlreadyConnected),
                ConnectionStatus::Rejected if !self.policy.allow_rerequest => {
                    return Err(GraphError::NotEligible)
                }
                // Dead pair; put_edge_pair overwrites it below.
                ConnectionStatus::Rejected => {}
            }
        }

        if !self.is_eligible(requester, target)? {
            return Err(GraphError::NotEligible);
        }

        self.db
            .put_edge_pair(requester, target, ConnectionStatus::Pending, requester)?;

        tracing::info!(requester = %requester, target = %target, "friend request sent");
        Ok(())
    }

    /// Accept or reject the pending request `requester` sent to `responder`.
    /// Both mirrored rows flip in one transaction.
    pub fn respond_to_request(
        &self,
        responder: &UserId,
        requester: &UserId,
        accept: bool,
    ) -> Result<()> {
        let status = if accept {
            ConnectionStatus::Accepted
        } else {
            ConnectionStatus::Rejected
        };

        let flipped = self.db.update_pending_pair(requester, responder, status)?;
        if !flipped {
            return Err(GraphError::NoSuchRequest);
        }

        tracing::info!(
            responder = %responder,
            requester = %requester,
            accepted = accept,
            "friend request answered"
        );
        Ok(())
    }

    /// Remove an accepted friendship.  Deletes both mirrored rows
    /// atomically; calling it again yields [`GraphError::NotFriends`].
    pub fn remove_friend(&self, a: &UserId, b: &UserId) -> Result<()> {
        let removed = self
            .db
            .delete_edge_pair(a, b, ConnectionStatus::Accepted)?;
        if !removed {
            return Err(GraphError::NotFriends);
        }

        tracing::info!(a = %a, b = %b, "friendship removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All peers with an accepted edge to `user`, ordered by id.
    pub fn list_friends(&self, user: &UserId) -> Result<Vec<UserId>> {
        Ok(self.db.accepted_peers(user)?)
    }

    /// Peers whose friend request awaits `user`'s answer, ordered by id.
    pub fn list_pending_requests(&self, user: &UserId) -> Result<Vec<UserId>> {
        Ok(self.db.pending_requests_for(user)?)
    }

    /// Breadth-first walk of the accepted graph around `user`, up to `hops`
    /// levels deep.  `user` never appears in the result; with
    /// `include_direct = false` the first level (direct friends) is skipped,
    /// giving the "friends of friends only" view.
    ///
    /// `hops` must be between 1 and the policy maximum (itself capped at
    /// [`HOP_CEILING`]); anything else fails with
    /// [`GraphError::HopLimitExceeded`] rather than being silently clamped.
    pub fn traverse_friends_of_friends(
        &self,
        user: &UserId,
        hops: u32,
        include_direct: bool,
    ) -> Result<Vec<UserId>> {
        let max = self.policy.max_traversal_hops.min(HOP_CEILING);
        if hops == 0 || hops > max {
            return Err(GraphError::HopLimitExceeded {
                requested: hops,
                max,
            });
        }

        let levels = traversal::bfs_levels(&self.db, user, hops)?;

        let mut out = Vec::new();
        for (depth, level) in levels.into_iter().enumerate() {
            if depth == 0 && !include_direct {
                continue;
            }
            out.extend(level);
        }
        Ok(out)
    }

    /// Whether `b` is reachable from `a` within `max_hops` accepted edges.
    /// Used internally by the eligibility rule; exposed for introspection.
    pub fn reachable(&self, a: &UserId, b: &UserId, max_hops: u32) -> Result<bool> {
        Ok(traversal::reachable(&self.db, a, b, max_hops)?)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn is_eligible(&self, requester: &UserId, target: &UserId) -> Result<bool> {
        let degree = self.db.accepted_degree(requester)?;
        if degree < self.policy.degree_threshold {
            return Ok(true);
        }

        let hops = self.policy.eligibility_hops.min(HOP_CEILING);
        Ok(traversal::reachable(&self.db, requester, target, hops)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reseau_store::User;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    fn engine_with_users(users: &[&str]) -> (tempfile::TempDir, ConnectionGraphEngine) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_at(&dir.path().join("test.db")).unwrap());
        for id in users {
            db.create_user(&User {
                id: uid(id),
                display_name: None,
                email: None,
                created_at: Utc::now(),
            })
            .unwrap();
        }
        let directory: Arc<dyn UserDirectory> = db.clone();
        let engine = ConnectionGraphEngine::new(db, directory, GraphPolicy::default());
        (dir, engine)
    }

    #[test]
    fn self_request_is_rejected() {
        let (_dir, engine) = engine_with_users(&["alice"]);
        assert!(matches!(
            engine.send_request(&uid("alice"), &uid("alice")),
            Err(GraphError::SelfRequest)
        ));
    }

    #[test]
    fn unknown_target_is_not_found() {
        let (_dir, engine) = engine_with_users(&["alice"]);
        assert!(matches!(
            engine.send_request(&uid("alice"), &uid("ghost")),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_request_is_already_pending() {
        let (_dir, engine) = engine_with_users(&["alice", "bob"]);
        engine.send_request(&uid("alice"), &uid("bob")).unwrap();
        assert!(matches!(
            engine.send_request(&uid("alice"), &uid("bob")),
            Err(GraphError::AlreadyPending)
        ));
        // The other direction is the same pending pair.
        assert!(matches!(
            engine.send_request(&uid("bob"), &uid("alice")),
            Err(GraphError::AlreadyPending)
        ));
    }

    #[test]
    fn traversal_hop_bound_is_enforced() {
        let (_dir, engine) = engine_with_users(&["alice"]);
        for bad in [0, 4, 100] {
            assert!(matches!(
                engine.traverse_friends_of_friends(&uid("alice"), bad, true),
                Err(GraphError::HopLimitExceeded { .. })
            ));
        }
    }
}
