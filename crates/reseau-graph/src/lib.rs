//! # reseau-graph
//!
//! The connection graph engine: friend-request workflow over mirrored edge
//! pairs, the reachability-based eligibility rule, and bounded
//! friends-of-friends traversal.
//!
//! The engine is a stateless request handler over [`reseau_store::Database`];
//! callers may invoke it concurrently from multiple threads.  All paired-edge
//! mutations are delegated to the store's transactional helpers so no caller
//! ever observes a half-updated mirror pair.

pub mod engine;
pub mod traversal;

mod error;

pub use engine::ConnectionGraphEngine;
pub use error::GraphError;
