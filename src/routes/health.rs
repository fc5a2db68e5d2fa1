use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (topic_sessions, exams) = state.sessions().active_counts();
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "generator": if state.config().llm.mock { "mock" } else { "llm" },
        "cachedContent": state.cache().len(),
        "activeTopicSessions": topic_sessions,
        "activeExams": exams,
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let healthy = state.store().load_user("__health_check__").is_ok();
    let latency_us = start.elapsed().as_micros() as u64;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "healthy": healthy,
            "latencyUs": latency_us,
            "users": state.store().count_users(),
        })),
    )
}
