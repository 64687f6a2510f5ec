//! OpenAI-compatible generation client.
//!
//! Talks to a chat-completions endpoint over HTTP. The engines never see the
//! wire format; they get back plain text or a `GenerationError` with the
//! transient/rejected distinction already made.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationError, Generator};

/// Default chat-completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for refinement passes
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Generation client for OpenAI-compatible chat APIs
pub struct OpenAiGenerator {
    api_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiGenerator {
    /// Create a client with a bounded request timeout
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        Ok(Self {
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn error_message(status: StatusCode, body: &str) -> String {
        serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .and_then(|e| e.error)
            .map(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", status))
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, context: &str, instruction: &str) -> Result<String, GenerationError> {
        let mut messages = vec![ChatMessage {
            role: "user",
            content: instruction,
        }];
        if !context.is_empty() {
            messages.push(ChatMessage {
                role: "user",
                content: context,
            });
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Transient(format!("request timed out: {}", e))
                } else {
                    GenerationError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = Self::error_message(status, &body);

            // Overload and server-side errors are worth retrying; anything
            // else is the service declining the request.
            return if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                Err(GenerationError::Transient(message))
            } else {
                Err(GenerationError::Rejected(message))
            };
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transient(format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!(chars = content.len(), "generation call returned");
        Ok(content.trim().to_string())
    }
}
