use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::constants::EXAM_TICK_SECS;
use crate::content::QuizQuestion;
use crate::session::{lock, FetchOutcome, SessionContext, SessionError};

/// One finished placement exam, as kept in the user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub date: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExamPhase {
    NotStarted,
    Ready,
    Started,
    Finished,
    Error,
}

impl fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExamPhase::NotStarted => "not started",
            ExamPhase::Ready => "ready",
            ExamPhase::Started => "started",
            ExamPhase::Finished => "finished",
            ExamPhase::Error => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Submitted,
    TimedOut,
}

/// Number of questions whose recorded answer equals the correct one.
/// Unanswered questions count as wrong.
pub fn score(questions: &[QuizQuestion], answers: &[Option<String>]) -> u32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| answer.as_deref().is_some_and(|a| question.is_correct(a)))
        .count() as u32
}

#[derive(Debug)]
struct ExamState {
    live: bool,
    phase: ExamPhase,
    fetching: bool,
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<String>>,
    time_left_secs: u64,
    error: Option<String>,
    result: Option<ExamResult>,
    /// Set once `result` is in the user's history.
    recorded: bool,
}

/// The timed placement exam of one user.
///
/// `NotStarted -> Ready -> Started -> Finished`, with `Error` reachable from
/// `NotStarted` when the questions cannot be produced. Finishing happens at
/// most once, either on submission or when the countdown reaches zero,
/// whichever takes the lock first. The result is appended to the history
/// under the same lock, and a failed append is retried by the next
/// [`finish`](ExamSession::finish).
pub struct ExamSession {
    id: Uuid,
    username: String,
    duration_secs: u64,
    ctx: SessionContext,
    state: Mutex<ExamState>,
}

impl ExamSession {
    pub fn new(username: &str, duration_secs: u64, ctx: SessionContext) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            duration_secs,
            ctx,
            state: Mutex::new(ExamState {
                live: true,
                phase: ExamPhase::NotStarted,
                fetching: false,
                questions: Vec::new(),
                answers: Vec::new(),
                time_left_secs: duration_secs,
                error: None,
                result: None,
                recorded: false,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_live(&self) -> bool {
        self.state().live
    }

    /// Stops the countdown and drops any late question set.
    pub fn abandon(&self) {
        let mut state = self.state();
        if state.live {
            state.live = false;
            tracing::debug!(exam = %self.id, "Exam abandoned");
        }
    }

    fn state(&self) -> MutexGuard<'_, ExamState> {
        lock(&self.state)
    }

    pub fn phase(&self) -> ExamPhase {
        self.state().phase
    }

    pub fn time_left_secs(&self) -> u64 {
        self.state().time_left_secs
    }

    pub fn result(&self) -> Option<ExamResult> {
        self.state().result.clone()
    }

    pub fn spawn_question_fetch(self: &Arc<Self>) -> JoinHandle<FetchOutcome> {
        let exam = Arc::clone(self);
        tokio::spawn(async move { exam.load_questions().await })
    }

    pub async fn load_questions(&self) -> FetchOutcome {
        {
            let mut state = self.state();
            if state.phase != ExamPhase::NotStarted || state.fetching {
                return FetchOutcome::Ignored;
            }
            state.fetching = true;
        }

        let result = self.ctx.generator.fetch_exam().await;
        let mut state = self.state();
        state.fetching = false;
        if !state.live {
            return FetchOutcome::Discarded;
        }
        match result {
            Ok(questions) => {
                tracing::info!(exam = %self.id, count = questions.len(), "Exam questions ready");
                state.answers = vec![None; questions.len()];
                state.questions = questions;
                state.phase = ExamPhase::Ready;
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(exam = %self.id, error = %e, "Exam generation failed");
                state.phase = ExamPhase::Error;
                state.error = Some(e.message);
                FetchOutcome::Failed
            }
        }
    }

    /// `Error -> NotStarted`; the caller then fetches the questions again.
    pub fn begin_retry(&self) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.phase != ExamPhase::Error {
            return Err(SessionError::InvalidPhase {
                phase: state.phase,
                action: "retry",
            });
        }
        state.phase = ExamPhase::NotStarted;
        state.error = None;
        Ok(())
    }

    /// `Ready -> Started` with the full duration on the clock.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.phase != ExamPhase::Ready {
            return Err(SessionError::InvalidPhase {
                phase: state.phase,
                action: "start",
            });
        }
        state.phase = ExamPhase::Started;
        state.time_left_secs = self.duration_secs;
        tracing::info!(exam = %self.id, user = %self.username, "Exam started");
        Ok(())
    }

    /// Ticks once per second until the exam leaves `Started`.
    pub fn spawn_countdown(self: &Arc<Self>) -> JoinHandle<()> {
        let exam = Arc::clone(self);
        tokio::spawn(async move {
            let period = Duration::from_secs(EXAM_TICK_SECS);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !exam.tick() {
                    break;
                }
            }
        })
    }

    /// One second of countdown. Returns whether the clock keeps running.
    pub fn tick(&self) -> bool {
        let mut state = self.state();
        if !state.live || state.phase != ExamPhase::Started {
            return false;
        }
        state.time_left_secs = state.time_left_secs.saturating_sub(1);
        if state.time_left_secs > 0 {
            return true;
        }
        Self::finish_locked(&mut state);
        if let Err(e) = self.record_locked(&mut state, FinishReason::TimedOut) {
            tracing::error!(exam = %self.id, error = %e, "Failed to record timed-out exam");
        }
        false
    }

    /// Records `option` as the answer to question `index`, replacing any
    /// earlier choice.
    pub fn select_answer(&self, index: usize, option: &str) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.phase != ExamPhase::Started {
            return Err(SessionError::InvalidPhase {
                phase: state.phase,
                action: "answer",
            });
        }
        let total = state.questions.len();
        let question = state
            .questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange { index, total })?;
        if !question.options.iter().any(|o| o == option) {
            return Err(SessionError::UnknownOption(index));
        }
        state.answers[index] = Some(option.to_string());
        Ok(())
    }

    /// Scores and records the exam. A finished exam whose result never
    /// reached the history is recorded again. `None` when there is nothing
    /// left to do, which includes losing the race against the countdown.
    pub fn finish(&self) -> Result<Option<ExamResult>, SessionError> {
        let mut state = self.state();
        if !state.live {
            return Ok(None);
        }
        match state.phase {
            ExamPhase::Started => Self::finish_locked(&mut state),
            ExamPhase::Finished if !state.recorded => {}
            _ => return Ok(None),
        }
        self.record_locked(&mut state, FinishReason::Submitted)?;
        Ok(state.result.clone())
    }

    /// Whether the result has been written to the user's history.
    pub fn is_recorded(&self) -> bool {
        self.state().recorded
    }

    fn finish_locked(state: &mut ExamState) {
        state.phase = ExamPhase::Finished;
        state.result = Some(ExamResult {
            date: Utc::now(),
            score: score(&state.questions, &state.answers),
            total: state.questions.len() as u32,
        });
    }

    fn record_locked(&self, state: &mut ExamState, reason: FinishReason) -> Result<(), SessionError> {
        let Some(result) = state.result.as_ref() else {
            return Ok(());
        };
        if state.recorded {
            return Ok(());
        }
        self.ctx.store.append_exam_result(&self.username, result)?;
        state.recorded = true;
        tracing::info!(
            exam = %self.id,
            user = %self.username,
            score = result.score,
            total = result.total,
            ?reason,
            "Exam finished"
        );
        Ok(())
    }

    pub fn answered(&self) -> usize {
        self.state().answers.iter().filter(|a| a.is_some()).count()
    }

    /// Correct answers and explanations are only revealed once finished.
    pub fn view(&self) -> ExamView {
        let state = self.state();
        let reveal = state.phase == ExamPhase::Finished;
        let questions = state
            .questions
            .iter()
            .map(|q| ExamQuestionView {
                question: q.question.clone(),
                options: q.options.clone(),
                correct_answer: reveal.then(|| q.correct_answer.clone()),
                explanation: if reveal { q.explanation.clone() } else { None },
            })
            .collect();
        ExamView {
            exam_id: self.id,
            phase: state.phase,
            duration_secs: self.duration_secs,
            time_left_secs: state.time_left_secs,
            total: state.questions.len(),
            answered: state.answers.iter().filter(|a| a.is_some()).count(),
            questions,
            answers: state.answers.clone(),
            error: state.error.clone(),
            result: state.result.clone(),
            recorded: state.recorded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamView {
    pub exam_id: Uuid,
    pub phase: ExamPhase,
    pub duration_secs: u64,
    pub time_left_secs: u64,
    pub total: usize,
    pub answered: usize,
    pub questions: Vec<ExamQuestionView>,
    pub answers: Vec<Option<String>>,
    pub error: Option<String>,
    pub result: Option<ExamResult>,
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionView {
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
