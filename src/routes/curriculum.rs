use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::curriculum::{topics_for, Level, Topic};
use crate::response::{ok, AppError};
use crate::session::progress::TopicProgress;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_levels))
        .route("/:level", get(list_topics))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelSummary {
    level: Level,
    description: &'static str,
    topic_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicSummary {
    #[serde(flatten)]
    topic: Topic,
    completed: bool,
    progress: TopicProgress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelTopics {
    level: Level,
    topics: Vec<TopicSummary>,
    completed_count: usize,
}

async fn list_levels() -> impl IntoResponse {
    let levels: Vec<LevelSummary> = Level::ALL
        .iter()
        .map(|&level| LevelSummary {
            level,
            description: level.description(),
            topic_count: topics_for(level).len(),
        })
        .collect();
    ok(levels)
}

async fn list_topics(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let level: Level = level
        .parse()
        .map_err(|_| AppError::bad_request("CURRICULUM_UNKNOWN_LEVEL", "Unknown level"))?;
    let user = state
        .store()
        .load_user(&auth.username)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let topics: Vec<TopicSummary> = topics_for(level)
        .iter()
        .map(|&topic| {
            let progress = user.progress_for(topic.id);
            TopicSummary {
                topic,
                completed: progress.is_complete(),
                progress,
            }
        })
        .collect();
    let completed_count = topics.iter().filter(|t| t.completed).count();
    Ok(ok(LevelTopics {
        level,
        topics,
        completed_count,
    }))
}
