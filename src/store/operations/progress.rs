use crate::session::exam::ExamResult;
use crate::session::progress::{ProgressUpdate, TopicProgress};
use crate::store::{Store, StoreError};

impl Store {
    pub fn progress_for(&self, username: &str, topic_id: &str) -> Result<TopicProgress, StoreError> {
        let user = self
            .load_user(username)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "user".to_string(),
                key: username.to_string(),
            })?;
        Ok(user.progress_for(topic_id))
    }

    /// Merges `update` into the stored progress: sections are unioned, a
    /// vocabulary set (when present) replaces the stored one.
    pub fn update_progress(
        &self,
        username: &str,
        topic_id: &str,
        update: &ProgressUpdate,
    ) -> Result<TopicProgress, StoreError> {
        self.modify_progress(username, topic_id, |_| update.clone())
    }

    /// Like `update_progress`, but the update is computed from the progress
    /// current at write time. `derive` may run more than once under contention.
    pub fn modify_progress<F>(
        &self,
        username: &str,
        topic_id: &str,
        derive: F,
    ) -> Result<TopicProgress, StoreError>
    where
        F: Fn(&TopicProgress) -> ProgressUpdate,
    {
        let mut merged = TopicProgress::default();
        self.update_user_with(username, |user| {
            let update = derive(&user.progress_for(topic_id));
            merged = user.apply_progress(topic_id, &update);
        })?;
        Ok(merged)
    }

    pub fn append_exam_result(&self, username: &str, result: &ExamResult) -> Result<(), StoreError> {
        self.update_user_with(username, |user| {
            user.exam_history.push(result.clone());
        })?;
        Ok(())
    }

    pub fn exam_history(&self, username: &str) -> Result<Vec<ExamResult>, StoreError> {
        Ok(self
            .load_user(username)?
            .map(|u| u.exam_history)
            .unwrap_or_default())
    }
}
