//! Bounded breadth-first exploration of the accepted-edge graph.
//!
//! The helpers here are pure queries: they never mutate the store and their
//! work is bounded by the hop limit, so worst-case latency is bounded too.

use std::collections::HashSet;

use reseau_shared::UserId;
use reseau_store::{Database, StoreError};

/// Expand outward from `start`, one hop per level, up to `max_hops` levels.
///
/// Returns one `Vec` per level (level 0 = direct friends), each sorted by
/// user id.  `start` itself never appears, and no user appears twice across
/// levels.  Stops early once a level comes up empty.
pub fn bfs_levels(
    db: &Database,
    start: &UserId,
    max_hops: u32,
) -> Result<Vec<Vec<UserId>>, StoreError> {
    let mut visited: HashSet<UserId> = HashSet::from([start.clone()]);
    let mut frontier = vec![start.clone()];
    let mut levels = Vec::new();

    for _ in 0..max_hops {
        let mut next = Vec::new();
        for user in &frontier {
            for peer in db.accepted_peers(user)? {
                if visited.insert(peer.clone()) {
                    next.push(peer);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        next.sort();
        levels.push(next.clone());
        frontier = next;
    }

    Ok(levels)
}

/// Whether `to` can be reached from `from` within `max_hops` accepted edges.
/// Short-circuits on the first hit.
pub fn reachable(
    db: &Database,
    from: &UserId,
    to: &UserId,
    max_hops: u32,
) -> Result<bool, StoreError> {
    if from == to {
        return Ok(true);
    }

    let mut visited: HashSet<UserId> = HashSet::from([from.clone()]);
    let mut frontier = vec![from.clone()];

    for _ in 0..max_hops {
        let mut next = Vec::new();
        for user in &frontier {
            for peer in db.accepted_peers(user)? {
                if peer == *to {
                    return Ok(true);
                }
                if visited.insert(peer.clone()) {
                    next.push(peer);
                }
            }
        }
        if next.is_empty() {
            return Ok(false);
        }
        frontier = next;
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reseau_shared::ConnectionStatus;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    /// a - b - c - d chain plus a - e.
    fn chain_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        for (x, y) in [("a", "b"), ("b", "c"), ("c", "d"), ("a", "e")] {
            db.put_edge_pair(&uid(x), &uid(y), ConnectionStatus::Accepted, &uid(x))
                .unwrap();
        }
        (dir, db)
    }

    #[test]
    fn levels_are_disjoint_and_sorted() {
        let (_dir, db) = chain_db();
        let levels = bfs_levels(&db, &uid("a"), 3).unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], vec![uid("b"), uid("e")]);
        assert_eq!(levels[1], vec![uid("c")]);
        assert_eq!(levels[2], vec![uid("d")]);
    }

    #[test]
    fn levels_stop_at_the_hop_bound() {
        let (_dir, db) = chain_db();
        let levels = bfs_levels(&db, &uid("a"), 1).unwrap();
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn reachability_respects_the_bound() {
        let (_dir, db) = chain_db();

        // d is three hops from a.
        assert!(reachable(&db, &uid("a"), &uid("d"), 3).unwrap());
        assert!(!reachable(&db, &uid("a"), &uid("d"), 2).unwrap());
        // Symmetric, since accepted edges are mirrored.
        assert!(reachable(&db, &uid("d"), &uid("a"), 3).unwrap());
    }

    #[test]
    fn disconnected_users_are_unreachable() {
        let (_dir, db) = chain_db();
        assert!(!reachable(&db, &uid("a"), &uid("zed"), 3).unwrap());
    }

    #[test]
    fn self_is_trivially_reachable() {
        let (_dir, db) = chain_db();
        assert!(reachable(&db, &uid("a"), &uid("a"), 0).unwrap());
    }
}
