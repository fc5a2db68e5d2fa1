use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::curriculum::{Level, Topic};
use crate::session::exam::ExamSession;
use crate::session::topic::TopicSession;
use crate::session::SessionContext;
use crate::store::keys;

/// The active topic session and exam of every signed-in user.
///
/// Binding a new session abandons the one it replaces, so a response that
/// arrives for the old one is dropped instead of leaking into the new view.
#[derive(Default)]
pub struct SessionRegistry {
    topics: RwLock<HashMap<String, Arc<TopicSession>>>,
    exams: RwLock<HashMap<String, Arc<ExamSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a fresh topic session and starts loading its lesson.
    pub fn open_topic(
        &self,
        ctx: SessionContext,
        username: &str,
        level: Level,
        topic: Topic,
    ) -> Arc<TopicSession> {
        let session = TopicSession::new(username, level, topic, ctx);
        self.bind_topic(session.clone());
        session.spawn_lesson_fetch();
        tracing::info!(user = %username, %level, topic = topic.id, "Topic session opened");
        session
    }

    pub fn bind_topic(&self, session: Arc<TopicSession>) {
        let key = keys::user_key(session.username());
        let previous = self
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, session);
        if let Some(previous) = previous {
            previous.abandon();
        }
    }

    pub fn topic(&self, username: &str) -> Option<Arc<TopicSession>> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&keys::user_key(username))
            .cloned()
    }

    pub fn leave_topic(&self, username: &str) -> bool {
        let removed = self
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&keys::user_key(username));
        match removed {
            Some(session) => {
                session.abandon();
                true
            }
            None => false,
        }
    }

    /// Binds a fresh exam and starts generating its questions.
    pub fn open_exam(&self, ctx: SessionContext, username: &str, duration_secs: u64) -> Arc<ExamSession> {
        let exam = ExamSession::new(username, duration_secs, ctx);
        self.bind_exam(exam.clone());
        exam.spawn_question_fetch();
        tracing::info!(user = %username, exam = %exam.id(), "Exam opened");
        exam
    }

    pub fn bind_exam(&self, exam: Arc<ExamSession>) {
        let key = keys::user_key(exam.username());
        let previous = self
            .exams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, exam);
        if let Some(previous) = previous {
            previous.abandon();
        }
    }

    pub fn exam(&self, username: &str) -> Option<Arc<ExamSession>> {
        self.exams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&keys::user_key(username))
            .cloned()
    }

    pub fn leave_exam(&self, username: &str) -> bool {
        let removed = self
            .exams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&keys::user_key(username));
        match removed {
            Some(exam) => {
                exam.abandon();
                true
            }
            None => false,
        }
    }

    /// Drops everything the user had open, on logout.
    pub fn leave_all(&self, username: &str) {
        self.leave_topic(username);
        self.leave_exam(username);
    }

    pub fn active_counts(&self) -> (usize, usize) {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner).len();
        let exams = self.exams.read().unwrap_or_else(PoisonError::into_inner).len();
        (topics, exams)
    }
}
