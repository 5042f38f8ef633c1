//! Time-boxed bearer token lookup.
//!
//! Tokens are 256-bit random hex strings handed to the client once. Only their
//! SHA-256 digest is persisted.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::db::{Database, DbError, SessionRecord};

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Invalid session lifetime: {0}")]
    InvalidTtl(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Bearer session store backed by the `sessions` table.
pub struct SessionStore<'a> {
    db: &'a Database,
}

impl<'a> SessionStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Issue a new token for `user_id`, valid for `ttl` from now.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> SessionResult<String> {
        if ttl <= Duration::zero() {
            return Err(SessionError::InvalidTtl(format!("{ttl}")));
        }

        let token = generate_token();
        let now = Utc::now();
        self.db.insert_session(&SessionRecord {
            token_digest: digest(&token),
            user_id: user_id.to_string(),
            expires_at: now + ttl,
            created_at: now,
        })?;

        tracing::debug!(user_id, "Session issued");
        Ok(token)
    }

    /// Resolve a token to its user ID. Expired sessions are removed and resolve to `None`.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> SessionResult<Option<String>> {
        let token_digest = digest(token);
        match self.db.get_session(&token_digest)? {
            Some(session) if session.expires_at > now => Ok(Some(session.user_id)),
            Some(_) => {
                self.db.delete_session(&token_digest)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Revoke a token. Returns `false` if it was unknown.
    pub fn revoke(&self, token: &str) -> SessionResult<bool> {
        Ok(self.db.delete_session(&digest(token))?)
    }

    /// Remove all sessions expired at `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> SessionResult<usize> {
        Ok(self.db.delete_expired_sessions(now)?)
    }
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
