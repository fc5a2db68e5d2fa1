use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// A signed-in device. The bearer token itself is never stored, only its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub token_hash: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Store {
    pub fn create_session(&self, session: &LoginSession) -> Result<(), StoreError> {
        let key = keys::session_key(&session.token_hash);
        self.sessions
            .insert(key.as_bytes(), Self::serialize(session)?)?;
        Ok(())
    }

    /// Looks up a login session. Expired sessions read as `None`.
    pub fn get_session(&self, token_hash: &str) -> Result<Option<LoginSession>, StoreError> {
        let key = keys::session_key(token_hash);
        let Some(raw) = self.sessions.get(key.as_bytes())? else {
            return Ok(None);
        };

        let session = Self::deserialize::<LoginSession>(&raw)?;
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        let key = keys::session_key(token_hash);
        self.sessions.remove(key.as_bytes())?;
        Ok(())
    }

    /// Drops expired sessions; returns how many were removed.
    pub fn purge_expired_sessions(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut removed = 0;
        for item in self.sessions.iter() {
            let (key, value) = item?;
            let expired = Self::deserialize::<LoginSession>(&value)
                .map(|s| s.expires_at <= now)
                .unwrap_or(true);
            if expired {
                self.sessions.remove(key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
