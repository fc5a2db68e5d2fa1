use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

pub const PASSWORD: &str = "Passw0rd!";

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

/// Registers `username` and returns its access token.
pub async fn register(app: &Router, username: &str, level: Option<&str>) -> String {
    let mut payload = serde_json::json!({
        "username": username,
        "password": PASSWORD,
    });
    if let Some(level) = level {
        payload["level"] = serde_json::json!(level);
    }

    let response = request(app, Method::POST, "/api/auth/register", Some(payload), &[]).await;
    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "register failed: {body}");

    body["data"]["accessToken"]
        .as_str()
        .expect("access token in register response")
        .to_string()
}

/// Registers a fresh A1 user and returns its access token.
pub async fn register_and_get_token(app: &Router) -> String {
    let username = format!("user-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
    register(app, &username, None).await
}
