//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] behind a mutex and
//! guarantees that migrations are run before any other operation.  The mutex
//! is the serialization point for concurrent callers: each typed helper locks
//! for the duration of one statement or one transaction, so distinct user
//! pairs and distinct messages never block each other for longer than a
//! single write.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use rusqlite::{Connection, Transaction};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a mutex-guarded `rusqlite::Connection`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/reseau/reseau.db`
    /// - macOS:   `~/Library/Application Support/com.reseau.reseau/reseau.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\reseau\reseau\data\reseau.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "reseau", "reseau").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("reseau.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read-only closure against the connection.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))?;
        f(&conn)
    }

    /// Run a closure inside a transaction.  The transaction commits when the
    /// closure returns `Ok` and rolls back on `Err`, so multi-row mutations
    /// (edge pairs, delete-and-purge) apply fully or not at all.
    pub(crate) fn with_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .lock()
            .ok()
            .and_then(|conn| conn.path().map(PathBuf::from))
    }
}
