use super::InterpretError;
use crate::config::{ApiKey, Llm};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One-shot completion against a hosted model. No retries: every call costs
/// provider tokens and failures go straight back to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn model(&self) -> &str;
    async fn complete(&self, system: &str, user: &str) -> Result<String, InterpretError>;
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http: Client,
    endpoint: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    api_key: ApiKey,
}

impl AnthropicClient {
    pub fn new(cfg: &Llm, api_key: ApiKey) -> Result<Self, InterpretError> {
        let mut builder = Client::builder();
        if cfg.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(cfg.timeout_seconds));
        }
        let http = builder.build().map_err(|e| InterpretError::ApiFailure {
            status: None,
            message: format!("building HTTP client: {e}"),
        })?;
        Ok(Self {
            http,
            endpoint: format!("{}/v1/messages", cfg.base_url.trim_end_matches('/')),
            api_version: cfg.api_version.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, InterpretError> {
        let started = Instant::now();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        debug!(model = %self.model, user_chars = user.chars().count(), "sending messages request");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| InterpretError::ApiFailure {
                status: None,
                message: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    format!("request failed: {e}")
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(env) => match env.error.kind {
                    Some(kind) => format!("{kind}: {}", env.error.message),
                    None => env.error.message,
                },
                Err(_) => text,
            };
            warn!(status = status.as_u16(), %message, "provider returned an error");
            return Err(InterpretError::ApiFailure {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| InterpretError::ApiFailure {
                    status: Some(status.as_u16()),
                    message: format!("unreadable provider response: {e}"),
                })?;

        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!(max_tokens = self.max_tokens, "reply hit max_tokens and is likely truncated");
        }

        let text = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            reply_chars = text.chars().count(),
            "model replied"
        );
        Ok(text)
    }
}
