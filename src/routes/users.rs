use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::curriculum::Level;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::session::exam::ExamResult;
use crate::session::progress::TopicProgress;
use crate::state::AppState;
use crate::store::operations::users::User;
use crate::validation::{validate_avatar, validate_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile))
        .route("/me/level", put(update_level))
        .route("/me/avatar", put(update_avatar))
        .route("/me/password", put(change_password))
}

/// The account as the client sees it; never carries the password hash.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub level: Level,
    pub avatar: Option<String>,
    pub progress: BTreeMap<String, TopicProgress>,
    pub exam_history: Vec<ExamResult>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(value: &User) -> Self {
        Self {
            name: value.name.clone(),
            level: value.level,
            avatar: value.avatar.clone(),
            progress: value.progress.clone(),
            exam_history: value.exam_history.clone(),
            created_at: value.created_at,
        }
    }
}

async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store()
        .load_user(&auth.username)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ok(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize)]
struct UpdateLevelRequest {
    level: Level,
}

async fn update_level(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateLevelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store()
        .update_user_with(&auth.username, |user| user.level = req.level)?;
    tracing::info!(user = %user.name, level = %user.level, "Level changed");
    Ok(ok(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize)]
struct UpdateAvatarRequest {
    #[serde(default)]
    avatar: Option<String>,
}

/// `null` clears the avatar.
async fn update_avatar(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateAvatarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let avatar = match req.avatar {
        Some(avatar) => {
            validate_avatar(&avatar)
                .map_err(|msg| AppError::bad_request("USER_INVALID_AVATAR", msg))?;
            Some(avatar.trim().to_string())
        }
        None => None,
    };
    let user = state
        .store()
        .update_user_with(&auth.username, |user| user.avatar = avatar.clone())?;
    Ok(ok(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(msg) = validate_password(&req.new_password) {
        return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
    }
    let user = state
        .store()
        .load_user(&auth.username)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password(&req.new_password)?;
    state
        .store()
        .update_user_with(&auth.username, |user| user.password_hash = password_hash.clone())?;
    Ok(ok(serde_json::json!({"passwordChanged": true})))
}
