use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::LLMConfig;

const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct LlmProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl LlmProvider {
    pub fn new(config: &LLMConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate LLM configuration at startup.
    /// Panics if the real API is selected (`enabled=true`, `mock=false`)
    /// without an endpoint or key, since every generation would fail.
    pub fn validate_config(config: &LLMConfig) {
        if config.enabled && !config.mock {
            if config.api_url.trim().is_empty() {
                panic!("Invalid LLM configuration: LLM_API_URL is empty. Set it or use LLM_MOCK=true.");
            }
            if config.api_key.trim().is_empty() {
                panic!("Invalid LLM configuration: LLM_API_KEY is empty. Set it or use LLM_MOCK=true.");
            }
        }
    }

    /// Sends a chat completion asking for a JSON object and returns the raw
    /// message content.
    pub async fn chat_json(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.api_url.trim().trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: &self.config.model,
            messages,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            stream: false,
        };

        let response = self.post_with_retry(&url, &payload).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        payload: &ChatRequest<'_>,
    ) -> Result<ChatResponse, LlmError> {
        let mut attempt = 0;
        loop {
            let result = self.post_once(url, payload).await;
            match result {
                Err(err) if attempt < MAX_RETRIES && err.is_retryable() => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS << attempt);
                    tracing::warn!(attempt, error = %err, "LLM request failed, retrying");
                    sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn post_once(&self, url: &str, payload: &ChatRequest<'_>) -> Result<ChatResponse, LlmError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm is disabled")]
    Disabled,
    #[error("llm request timed out")]
    Timeout,
    #[error("llm network error: {0}")]
    Network(String),
    #[error("llm api error: status={status}, message={message}")]
    ApiError { status: u16, message: String },
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Timeout | LlmError::Network(_) => true,
            LlmError::ApiError { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
