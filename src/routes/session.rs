use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::task::JoinError;

use crate::auth::AuthUser;
use crate::curriculum::{find_topic, Level};
use crate::extractors::JsonBody;
use crate::response::{created, ok, ApiResponse, AppError};
use crate::session::topic::{SubmitOutcome, SubmitRejection, TopicSession};
use crate::session::{FetchOutcome, SessionError};
use crate::state::AppState;
use crate::validation::{validate_task_answer, validate_vocabulary_word};

/// `/api/topics`: opening a topic.
pub fn topics_router() -> Router<AppState> {
    Router::new().route("/:topic_id/session", post(open_session))
}

/// `/api/session`: the open topic of the signed-in user.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session).delete(leave_session))
        .route("/practice", post(generate_practice))
        .route("/vocabulary", post(toggle_vocabulary))
        .route("/tasks/:index/answer", post(submit_answer))
}

fn active(state: &AppState, auth: &AuthUser) -> Result<std::sync::Arc<TopicSession>, AppError> {
    state
        .sessions()
        .topic(&auth.username)
        .ok_or_else(|| SessionError::NoTopicSession.into())
}

fn task_failed(e: JoinError) -> AppError {
    AppError::internal(&format!("session task failed: {e}"))
}

fn rejection(r: SubmitRejection) -> AppError {
    match r {
        SubmitRejection::EmptyAnswer => AppError::bad_request("TASK_EMPTY_ANSWER", r.reason()),
        SubmitRejection::AlreadyEvaluated => AppError::conflict("TASK_ALREADY_EVALUATED", r.reason()),
        SubmitRejection::InFlight => AppError::conflict("TASK_IN_FLIGHT", r.reason()),
        SubmitRejection::NoPractice => AppError::conflict("PRACTICE_MISSING", r.reason()),
        SubmitRejection::UnknownTask => AppError::not_found_code("TASK_NOT_FOUND", r.reason()),
    }
}

#[derive(Debug, Deserialize)]
struct OpenSessionQuery {
    #[serde(default)]
    level: Option<Level>,
}

/// Replaces whatever topic was open; the lesson starts loading right away.
async fn open_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Query(query): Query<OpenSessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let level = match query.level {
        Some(level) => level,
        None => {
            state
                .store()
                .load_user(&auth.username)?
                .ok_or_else(|| AppError::not_found("User not found"))?
                .level
        }
    };
    let topic = find_topic(level, &topic_id)
        .ok_or_else(|| AppError::not_found_code("TOPIC_NOT_FOUND", "Topic not found"))?;

    let session = state
        .sessions()
        .open_topic(state.session_context(), &auth.username, level, topic);
    Ok(created(session.view()?))
}

async fn get_session(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let session = active(&state, &auth)?;
    Ok(ok(session.view()?))
}

async fn leave_session(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let left = state.sessions().leave_topic(&auth.username);
    Ok(ok(serde_json::json!({ "left": left })))
}

/// Generates the practice, or a new one when one is already shown. A
/// generation failure is reported inside the returned view.
async fn generate_practice(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let session = active(&state, &auth)?;
    let Some(request) = session.begin_practice() else {
        return Ok((StatusCode::ACCEPTED, Json(ApiResponse { success: true, data: session.view()? })));
    };

    let outcome = session
        .spawn_practice_fetch(request)
        .await
        .map_err(task_failed)?;
    if outcome == FetchOutcome::Discarded {
        return Err(SessionError::NoTopicSession.into());
    }
    Ok((StatusCode::OK, Json(ApiResponse { success: true, data: session.view()? })))
}

#[derive(Debug, Deserialize)]
struct ToggleVocabularyRequest {
    word: String,
}

async fn toggle_vocabulary(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ToggleVocabularyRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_vocabulary_word(&req.word)
        .map_err(|msg| AppError::bad_request("VOCABULARY_INVALID_WORD", msg))?;
    let session = active(&state, &auth)?;
    let progress = session.toggle_vocabulary(req.word.trim())?;
    Ok(ok(progress))
}

#[derive(Debug, Deserialize)]
struct SubmitAnswerRequest {
    answer: String,
}

async fn submit_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(index): Path<usize>,
    JsonBody(req): JsonBody<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_task_answer(&req.answer)
        .map_err(|msg| AppError::bad_request("TASK_INVALID_ANSWER", msg))?;
    let session = active(&state, &auth)?;
    let pending = session
        .begin_evaluation(index, &req.answer)
        .map_err(rejection)?;

    match session.spawn_evaluation(pending).await.map_err(task_failed)? {
        SubmitOutcome::Evaluated(feedback) => Ok(ok(feedback)),
        SubmitOutcome::Rejected(r) => Err(rejection(r)),
        SubmitOutcome::Discarded => Err(AppError::conflict(
            "TASK_DISCARDED",
            "The practice changed before the answer was evaluated",
        )),
    }
}
