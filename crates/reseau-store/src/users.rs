//! CRUD operations for [`User`] records and the directory seam consumed by
//! the engines.

use chrono::{DateTime, Utc};
use rusqlite::params;

use reseau_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

/// The identity contract the engines consume.
///
/// The bundled `users` table implements it, but deployments may substitute
/// any resolver (an RPC client, an LDAP lookup) without touching the engines.
pub trait UserDirectory: Send + Sync {
    /// Whether a user with this id exists.
    fn exists(&self, id: &UserId) -> Result<bool>;
}

impl UserDirectory for Database {
    fn exists(&self, id: &UserId) -> Result<bool> {
        self.user_exists(id)
    }
}

impl Database {
    /// Insert a new user.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, display_name, email, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id.as_str(),
                    user.display_name,
                    user.email,
                    user.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, display_name, email, created_at
                 FROM users
                 WHERE id = ?1",
                params![id.as_str()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => other.into(),
            })
        })
    }

    /// Whether a user with this id exists.
    pub fn user_exists(&self, id: &UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT count(*) FROM users WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Case-insensitive substring search on display name, ordered by id.
    pub fn search_users(&self, name: &str) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, email, created_at
                 FROM users
                 WHERE display_name LIKE '%' || ?1 || '%'
                 ORDER BY id ASC",
            )?;

            let rows = stmt.query_map(params![name], row_to_user)?;

            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let display_name: Option<String> = row.get(1)?;
    let email: Option<String> = row.get(2)?;
    let created_str: String = row.get(3)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: UserId::new(id),
        display_name,
        email,
        created_at,
    })
}
