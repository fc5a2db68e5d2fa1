use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::{dummy_password_hash, hash_password, issue_session, verify_password, AuthUser};
use crate::curriculum::Level;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::routes::users::UserProfile;
use crate::state::AppState;
use crate::store::operations::users::User;
use crate::store::StoreError;
use crate::validation::{validate_password, validate_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub level: Option<Level>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Response, AppError> {
    let username = req.username.trim();
    if let Err(msg) = validate_username(username) {
        return Err(AppError::bad_request("AUTH_INVALID_USERNAME", msg));
    }
    if let Err(msg) = validate_password(&req.password) {
        return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
    }

    let user = User::new(
        username,
        hash_password(&req.password)?,
        req.level.unwrap_or_default(),
    );
    match state.store().create_user(&user) {
        Ok(()) => {}
        Err(StoreError::Conflict { .. }) => {
            return Err(AppError::conflict(
                "AUTH_USERNAME_TAKEN",
                "Username already taken",
            ));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(user = %user.name, level = %user.level, "User registered");

    let access_token = issue_session(&state, &user.name)?;
    let mut response = created(AuthResponse {
        access_token: access_token.clone(),
        user: UserProfile::from(&user),
    })
    .into_response();
    set_token_cookie(&mut response, &access_token)?;
    Ok(response)
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let Some(user) = state.store().load_user(&req.username)? else {
        let _ = verify_password(&req.password, dummy_password_hash());
        return Err(AppError::unauthorized("Invalid username or password"));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user = %user.name, "Failed login attempt");
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    let access_token = issue_session(&state, &user.name)?;
    let mut response = ok(AuthResponse {
        access_token: access_token.clone(),
        user: UserProfile::from(&user),
    })
    .into_response();
    set_token_cookie(&mut response, &access_token)?;
    Ok(response)
}

/// Revokes the presented token and closes the user's topic and exam.
async fn logout(auth_user: AuthUser, State(state): State<AppState>) -> Result<Response, AppError> {
    state.store().delete_session(&auth_user.token_hash)?;
    state.sessions().leave_all(&auth_user.username);
    tracing::info!(user = %auth_user.username, "User logged out");

    let mut response = ok(serde_json::json!({"loggedOut": true})).into_response();
    append_set_cookie(
        &mut response,
        "token=; Path=/; Max-Age=0; SameSite=Strict; HttpOnly",
        "token cookie clear failed",
    )?;
    Ok(response)
}

fn set_token_cookie(response: &mut Response, token: &str) -> Result<(), AppError> {
    let cookie = format!("token={token}; Path=/; SameSite=Strict; HttpOnly");
    append_set_cookie(response, &cookie, "token cookie set failed")
}

fn append_set_cookie(
    response: &mut Response,
    cookie: &str,
    error_context: &str,
) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::internal(&format!("{error_context}: {e}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
