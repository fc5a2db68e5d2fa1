pub mod auth;
pub mod curriculum;
pub mod exam;
pub mod health;
pub mod session;
pub mod users;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use tower_http::services::{ServeDir, ServeFile};

use crate::response::ErrorBody;
use crate::state::AppState;

/// Maximum request body size: 64 KiB.
const MAX_BODY_SIZE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/curriculum", curriculum::router())
        .nest("/topics", session::topics_router())
        .nest("/session", session::router())
        .nest("/exam", exam::router())
        .fallback(api_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    // The browser app is served from the same origin, with SPA fallback.
    let static_dir = Path::new(&state.config().static_dir).to_path_buf();
    let spa_fallback =
        ServeDir::new(&static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback_service(spa_fallback)
        .with_state(state)
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            code: "NOT_FOUND".to_string(),
            message: "Not found".to_string(),
            trace_id: None,
        }),
    )
}
