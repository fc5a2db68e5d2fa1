use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::content::{AnswerEvaluation, ComprehensivePractice, LessonContent, TaskItem};
use crate::curriculum::{Level, Topic};
use crate::services::generator::GenerationResult;
use crate::session::progress::{ProgressUpdate, Section, TopicProgress};
use crate::session::{lock, FetchOutcome, LoadStatus, SessionContext, SessionError};

/// Feedback shown under one follow-up task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFeedback {
    pub text: String,
    pub loading: bool,
    /// Absent while loading and when the evaluation request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl TaskFeedback {
    fn pending() -> Self {
        Self {
            text: String::new(),
            loading: true,
            is_correct: None,
        }
    }

    fn resolved(evaluation: AnswerEvaluation) -> Self {
        Self {
            text: evaluation.feedback,
            loading: false,
            is_correct: Some(evaluation.is_correct),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            text: message,
            loading: false,
            is_correct: None,
        }
    }

    /// A completed evaluation locks the task against resubmission.
    pub fn is_final(&self) -> bool {
        !self.loading && self.is_correct.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    EmptyAnswer,
    AlreadyEvaluated,
    InFlight,
    NoPractice,
    UnknownTask,
}

impl SubmitRejection {
    pub fn reason(self) -> &'static str {
        match self {
            SubmitRejection::EmptyAnswer => "answer must not be empty",
            SubmitRejection::AlreadyEvaluated => "task has already been evaluated",
            SubmitRejection::InFlight => "task evaluation is already in progress",
            SubmitRejection::NoPractice => "no practice session has been generated",
            SubmitRejection::UnknownTask => "task does not exist",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(SubmitRejection),
    Evaluated(TaskFeedback),
    /// The practice was regenerated or the session abandoned meanwhile.
    Discarded,
}

/// Accepted practice request, produced by [`TopicSession::begin_practice`].
#[derive(Debug, Clone, Copy)]
pub struct PracticeRequest {
    refresh: bool,
}

impl PracticeRequest {
    /// Content was already shown, so the cache is bypassed.
    pub fn is_refresh(&self) -> bool {
        self.refresh
    }
}

/// Accepted task submission, produced by [`TopicSession::begin_evaluation`].
#[derive(Debug, Clone)]
pub struct PendingEvaluation {
    index: usize,
    generation: u64,
    task: TaskItem,
    answer: String,
}

impl PendingEvaluation {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Default)]
struct LessonPane {
    status: LoadStatus,
    content: Option<Arc<LessonContent>>,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct PracticePane {
    status: LoadStatus,
    content: Option<Arc<ComprehensivePractice>>,
    error: Option<String>,
    /// Bumped whenever new content replaces the old; evaluations carry the
    /// value they were started under.
    generation: u64,
    feedback: BTreeMap<usize, TaskFeedback>,
}

#[derive(Debug)]
struct TopicState {
    /// Cleared by [`TopicSession::abandon`]. Completions check it under the
    /// same lock they apply under.
    live: bool,
    lesson: LessonPane,
    practice: PracticePane,
}

/// One user's view of one topic: its lesson, its practice, and the answers
/// given to the practice tasks.
pub struct TopicSession {
    id: Uuid,
    username: String,
    level: Level,
    topic: Topic,
    ctx: SessionContext,
    state: Mutex<TopicState>,
}

impl TopicSession {
    /// A new session, with the lesson marked as loading. Call
    /// [`spawn_lesson_fetch`](Self::spawn_lesson_fetch) or
    /// [`load_lesson`](Self::load_lesson) to fill it.
    pub fn new(username: &str, level: Level, topic: Topic, ctx: SessionContext) -> Arc<Self> {
        let state = TopicState {
            live: true,
            lesson: LessonPane {
                status: LoadStatus::Loading,
                ..LessonPane::default()
            },
            practice: PracticePane::default(),
        };
        Arc::new(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            level,
            topic,
            ctx,
            state: Mutex::new(state),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn is_live(&self) -> bool {
        self.state().live
    }

    /// Late responses for an abandoned session are dropped.
    pub fn abandon(&self) {
        let mut state = self.state();
        if state.live {
            state.live = false;
            tracing::debug!(session = %self.id, topic = self.topic.id, "Topic session abandoned");
        }
    }

    fn state(&self) -> MutexGuard<'_, TopicState> {
        lock(&self.state)
    }

    pub fn spawn_lesson_fetch(self: &Arc<Self>) -> JoinHandle<FetchOutcome> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.load_lesson().await })
    }

    /// Fetches the lesson once. A failure stays on screen; entering the
    /// topic again is the way to retry.
    pub async fn load_lesson(&self) -> FetchOutcome {
        let result = self
            .ctx
            .cache
            .lesson_or_fetch(self.ctx.generator.as_ref(), self.level, self.topic)
            .await;
        self.apply_lesson(result)
    }

    fn apply_lesson(&self, result: GenerationResult<Arc<LessonContent>>) -> FetchOutcome {
        let mut state = self.state();
        if !state.live {
            tracing::debug!(session = %self.id, "Discarding lesson for abandoned session");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(lesson) => {
                state.lesson = LessonPane {
                    status: LoadStatus::Ready,
                    content: Some(lesson),
                    error: None,
                };
                self.complete_section(Section::Lesson);
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(topic = self.topic.id, error = %e, "Lesson fetch failed");
                state.lesson.status = LoadStatus::Error;
                state.lesson.error = Some(e.message);
                FetchOutcome::Failed
            }
        }
    }

    /// Writes the section only when it is not recorded yet. Callers hold the
    /// state lock so an abandon cannot slip in between.
    fn complete_section(&self, section: Section) {
        let result = self.ctx.store.modify_progress(&self.username, self.topic.id, |current| {
            if current.has_section(section) {
                ProgressUpdate::default()
            } else {
                ProgressUpdate::complete_section(section)
            }
        });
        match result {
            Ok(progress) => tracing::info!(
                user = %self.username,
                topic = self.topic.id,
                ?section,
                complete = progress.is_complete(),
                "Section completed"
            ),
            Err(e) => tracing::error!(
                user = %self.username,
                topic = self.topic.id,
                error = %e,
                "Failed to record section completion"
            ),
        }
    }

    /// `None` while a practice request is already in flight.
    pub fn begin_practice(&self) -> Option<PracticeRequest> {
        let mut state = self.state();
        if state.practice.status == LoadStatus::Loading {
            return None;
        }
        state.practice.status = LoadStatus::Loading;
        state.practice.error = None;
        Some(PracticeRequest {
            refresh: state.practice.content.is_some(),
        })
    }

    /// On failure the previously shown practice and its feedback stay.
    pub async fn complete_practice(&self, request: PracticeRequest) -> FetchOutcome {
        let result = self
            .ctx
            .cache
            .practice_or_fetch(
                self.ctx.generator.as_ref(),
                self.level,
                self.topic,
                request.refresh,
            )
            .await;
        self.apply_practice(result)
    }

    fn apply_practice(&self, result: GenerationResult<Arc<ComprehensivePractice>>) -> FetchOutcome {
        let mut state = self.state();
        if !state.live {
            tracing::debug!(session = %self.id, "Discarding practice for abandoned session");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(practice) => {
                let pane = &mut state.practice;
                pane.status = LoadStatus::Ready;
                pane.content = Some(practice);
                pane.error = None;
                pane.generation += 1;
                pane.feedback.clear();
                self.complete_section(Section::Practice);
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(topic = self.topic.id, error = %e, "Practice fetch failed");
                state.practice.status = LoadStatus::Error;
                state.practice.error = Some(e.message);
                FetchOutcome::Failed
            }
        }
    }

    pub async fn generate_practice(&self) -> FetchOutcome {
        match self.begin_practice() {
            Some(request) => self.complete_practice(request).await,
            None => FetchOutcome::Ignored,
        }
    }

    pub fn spawn_practice_fetch(self: &Arc<Self>, request: PracticeRequest) -> JoinHandle<FetchOutcome> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.complete_practice(request).await })
    }

    /// Flips `word` in the learned vocabulary of this topic.
    pub fn toggle_vocabulary(&self, word: &str) -> Result<TopicProgress, SessionError> {
        let progress = self.ctx.store.modify_progress(&self.username, self.topic.id, |current| {
            ProgressUpdate::replace_vocabulary(current.toggled_vocabulary(word))
        })?;
        Ok(progress)
    }

    /// Validates a submission and marks the task as loading.
    pub fn begin_evaluation(
        &self,
        index: usize,
        answer: &str,
    ) -> Result<PendingEvaluation, SubmitRejection> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SubmitRejection::EmptyAnswer);
        }

        let mut state = self.state();
        let pane = &mut state.practice;
        let Some(content) = pane.content.as_ref() else {
            return Err(SubmitRejection::NoPractice);
        };
        let Some(task) = content.task(index).cloned() else {
            return Err(SubmitRejection::UnknownTask);
        };
        match pane.feedback.get(&index) {
            Some(feedback) if feedback.loading => return Err(SubmitRejection::InFlight),
            Some(feedback) if feedback.is_final() => return Err(SubmitRejection::AlreadyEvaluated),
            _ => {}
        }

        pane.feedback.insert(index, TaskFeedback::pending());
        Ok(PendingEvaluation {
            index,
            generation: pane.generation,
            task,
            answer: answer.to_string(),
        })
    }

    pub async fn complete_evaluation(&self, pending: PendingEvaluation) -> SubmitOutcome {
        let PendingEvaluation {
            index,
            generation,
            task,
            answer,
        } = pending;
        let result = self.ctx.generator.evaluate_answer(task, answer).await;
        let mut state = self.state();
        if !state.live {
            return SubmitOutcome::Discarded;
        }
        if state.practice.generation != generation {
            tracing::debug!(index, "Discarding evaluation for replaced practice");
            return SubmitOutcome::Discarded;
        }
        let feedback = match result {
            Ok(evaluation) => TaskFeedback::resolved(evaluation),
            Err(e) => {
                tracing::warn!(index, error = %e, "Answer evaluation failed");
                TaskFeedback::failed(e.message)
            }
        };
        state.practice.feedback.insert(index, feedback.clone());
        SubmitOutcome::Evaluated(feedback)
    }

    pub async fn submit_answer(&self, index: usize, answer: &str) -> SubmitOutcome {
        match self.begin_evaluation(index, answer) {
            Ok(pending) => self.complete_evaluation(pending).await,
            Err(rejection) => SubmitOutcome::Rejected(rejection),
        }
    }

    pub fn spawn_evaluation(self: &Arc<Self>, pending: PendingEvaluation) -> JoinHandle<SubmitOutcome> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.complete_evaluation(pending).await })
    }

    pub fn lesson_status(&self) -> LoadStatus {
        self.state().lesson.status
    }

    pub fn lesson(&self) -> Option<Arc<LessonContent>> {
        self.state().lesson.content.clone()
    }

    pub fn practice(&self) -> Option<Arc<ComprehensivePractice>> {
        self.state().practice.content.clone()
    }

    pub fn feedback(&self, index: usize) -> Option<TaskFeedback> {
        self.state().practice.feedback.get(&index).cloned()
    }

    pub fn view(&self) -> Result<TopicSessionView, SessionError> {
        let progress = self.ctx.store.progress_for(&self.username, self.topic.id)?;
        let state = self.state();
        Ok(TopicSessionView {
            session_id: self.id,
            level: self.level,
            topic: self.topic,
            lesson: LessonView {
                status: state.lesson.status,
                content: state.lesson.content.as_deref().cloned(),
                error: state.lesson.error.clone(),
            },
            practice: PracticeView {
                status: state.practice.status,
                content: state.practice.content.as_deref().cloned(),
                error: state.practice.error.clone(),
                feedback: state.practice.feedback.clone(),
            },
            complete: progress.is_complete(),
            progress,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSessionView {
    pub session_id: Uuid,
    pub level: Level,
    pub topic: Topic,
    pub lesson: LessonView,
    pub practice: PracticeView,
    pub progress: TopicProgress,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub status: LoadStatus,
    pub content: Option<LessonContent>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeView {
    pub status: LoadStatus,
    pub content: Option<ComprehensivePractice>,
    pub error: Option<String>,
    pub feedback: BTreeMap<usize, TaskFeedback>,
}
