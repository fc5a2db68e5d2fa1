use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::session::exam::ExamSession;
use crate::session::SessionError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(get_exam).delete(leave_exam))
        .route("/start", post(start_exam))
        .route("/answers/:index", put(select_answer))
        .route("/finish", post(finish_exam))
        .route("/retry", post(retry_exam))
        .route("/history", get(history))
}

fn active(state: &AppState, auth: &AuthUser) -> Result<Arc<ExamSession>, AppError> {
    state
        .sessions()
        .exam(&auth.username)
        .ok_or_else(|| SessionError::NoExam.into())
}

/// Opens a new exam, abandoning any previous one, and starts generating the
/// questions immediately.
async fn create_exam(auth: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let exam = state.sessions().open_exam(
        state.session_context(),
        &auth.username,
        state.config().exam.duration_secs,
    );
    created(exam.view())
}

async fn get_exam(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(active(&state, &auth)?.view()))
}

async fn leave_exam(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let left = state.sessions().leave_exam(&auth.username);
    Ok(ok(serde_json::json!({ "left": left })))
}

async fn start_exam(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let exam = active(&state, &auth)?;
    exam.start()?;
    exam.spawn_countdown();
    Ok(ok(exam.view()))
}

#[derive(Debug, Deserialize)]
struct SelectAnswerRequest {
    answer: String,
}

async fn select_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(index): Path<usize>,
    JsonBody(req): JsonBody<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = active(&state, &auth)?;
    exam.select_answer(index, &req.answer)?;
    Ok(ok(serde_json::json!({
        "index": index,
        "answer": req.answer,
        "answered": exam.answered(),
        "timeLeftSecs": exam.time_left_secs(),
    })))
}

/// Idempotent: a second call, or one racing the countdown, returns the
/// already recorded result.
async fn finish_exam(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let exam = active(&state, &auth)?;
    if exam.finish()?.is_none() && exam.result().is_none() {
        return Err(SessionError::InvalidPhase {
            phase: exam.phase(),
            action: "finish",
        }
        .into());
    }
    Ok(ok(exam.view()))
}

async fn retry_exam(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let exam = active(&state, &auth)?;
    exam.begin_retry()?;
    exam.spawn_question_fetch();
    Ok(ok(exam.view()))
}

async fn history(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().exam_history(&auth.username)?))
}
