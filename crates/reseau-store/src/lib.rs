//! # reseau-store
//!
//! Persistence layer for the Réseau engines, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` behind a mutex and provides typed helpers for
//! every domain model.  Mirrored edge-pair writes and message lifecycle
//! transitions run inside a single SQLite transaction so callers never
//! observe a half-updated pair.

pub mod connections;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use users::UserDirectory;
