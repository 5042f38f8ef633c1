//! Bearer session database operations.
//!
//! Only the digest of a token is stored; the raw token never reaches disk.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

/// A stored session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub token_digest: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Database {
    /// Insert a session.
    pub fn insert_session(&self, session: &SessionRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions (token_digest, user_id, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.token_digest,
                session.user_id,
                session.expires_at,
                session.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a session by token digest.
    pub fn get_session(&self, token_digest: &str) -> DbResult<Option<SessionRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT token_digest, user_id, expires_at, created_at
                FROM sessions
                WHERE token_digest = ?
                "#,
                [token_digest],
                |row| {
                    Ok(SessionRecord {
                        token_digest: row.get(0)?,
                        user_id: row.get(1)?,
                        expires_at: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a session.
    pub fn delete_session(&self, token_digest: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token_digest = ?", [token_digest])?;
        Ok(rows_affected > 0)
    }

    /// Delete every session that expired at or before `now`.
    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?", [now])?;
        Ok(rows_affected)
    }
}
