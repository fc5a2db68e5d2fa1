use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_CAS_RETRIES;
use crate::curriculum::Level;
use crate::session::exam::ExamResult;
use crate::session::progress::{ProgressUpdate, TopicProgress};
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub progress: BTreeMap<String, TopicProgress>,
    #[serde(default)]
    pub exam_history: Vec<ExamResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, password_hash: String, level: Level) -> Self {
        let now = Utc::now();
        Self {
            name: name.trim().to_string(),
            password_hash,
            level,
            avatar: None,
            progress: BTreeMap::new(),
            exam_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> String {
        keys::user_key(&self.name)
    }

    /// Progress for a topic; a topic never touched reads as empty progress.
    pub fn progress_for(&self, topic_id: &str) -> TopicProgress {
        self.progress.get(topic_id).cloned().unwrap_or_default()
    }

    pub fn apply_progress(&mut self, topic_id: &str, update: &ProgressUpdate) -> TopicProgress {
        let next = self.progress_for(topic_id).merged(update);
        self.progress.insert(topic_id.to_string(), next.clone());
        next
    }

    pub fn is_topic_complete(&self, topic_id: &str) -> bool {
        self.progress
            .get(topic_id)
            .is_some_and(TopicProgress::is_complete)
    }
}

impl Store {
    pub fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let key = user.key();
        let user_bytes = Self::serialize(user)?;

        let cas_result = self
            .users
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(user_bytes))
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "user".to_string(),
                key: user.name.clone(),
            });
        }

        Ok(())
    }

    pub fn load_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let key = keys::user_key(username);
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Unconditional write of the whole account record.
    pub fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .insert(user.key().as_bytes(), Self::serialize(user)?)?;
        Ok(())
    }

    /// Read-modify-write of one account guarded by compare-and-swap, so
    /// concurrent writers merge instead of overwriting each other.
    pub fn update_user_with<F>(&self, username: &str, mut mutate: F) -> Result<User, StoreError>
    where
        F: FnMut(&mut User),
    {
        let key = keys::user_key(username);
        for _ in 0..MAX_CAS_RETRIES {
            let Some(current) = self.users.get(key.as_bytes())? else {
                return Err(StoreError::NotFound {
                    entity: "user".to_string(),
                    key,
                });
            };

            let mut user: User = Self::deserialize(&current)?;
            mutate(&mut user);
            user.updated_at = Utc::now();
            let next = Self::serialize(&user)?;

            if self
                .users
                .compare_and_swap(key.as_bytes(), Some(current), Some(next))?
                .is_ok()
            {
                return Ok(user);
            }
            tracing::debug!(user = %key, "User record changed concurrently, retrying");
        }

        Err(StoreError::CasRetryExhausted {
            entity: "user".to_string(),
            key,
            attempts: MAX_CAS_RETRIES,
        })
    }

    pub fn count_users(&self) -> usize {
        self.users.len()
    }
}
