//! Per-user learning sessions: the topic session (lesson + practice) and the
//! placement exam, plus the registry that owns the active one of each.

pub mod exam;
pub mod progress;
pub mod registry;
pub mod topic;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::services::content_cache::ContentCache;
use crate::services::generator::ContentGenerator;
use crate::store::{Store, StoreError};
use exam::ExamPhase;

/// Collaborators every session needs.
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<Store>,
    pub cache: Arc<ContentCache>,
    pub generator: Arc<dyn ContentGenerator>,
}

/// What happened to the result of an asynchronous fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// A fetch of the same kind was already in flight.
    Ignored,
    /// The session was abandoned before the response arrived.
    Discarded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active topic session")]
    NoTopicSession,
    #[error("no active exam")]
    NoExam,
    #[error("exam is {phase}, cannot {action}")]
    InvalidPhase {
        phase: ExamPhase,
        action: &'static str,
    },
    #[error("question {index} does not exist (exam has {total})")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("answer is not one of the options of question {0}")]
    UnknownOption(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
