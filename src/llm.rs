//! OpenAI-compatible chat-completions client.
//!
//! Every failure path terminates in exactly one [`LlmError`] variant so
//! callers can handle the taxonomy exhaustively. The client never retries:
//! a failed call surfaces immediately, and retry policy (if any) belongs to
//! the caller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::prompts::build_test_prompt;

/// Classified failure from the model gateway.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("connection timed out; check the network or the API base URL")]
    ConnectionTimeout(#[source] reqwest::Error),

    #[error("request timed out; the API took too long to respond")]
    RequestTimeout(#[source] reqwest::Error),

    #[error("authentication failed; the API key is invalid or expired")]
    Authentication,

    #[error("API quota exhausted; check the account balance or plan")]
    QuotaExceeded,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network failure; check connectivity and the API base URL")]
    Network(#[source] reqwest::Error),

    #[error("failed to parse the model response: {0}")]
    Parse(String),

    #[error("unexpected model API failure: {0}")]
    Unknown(String),
}

/// Connect/request deadlines for the HTTP client.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for any OpenAI-compatible chat-completions endpoint
/// (OpenAI, DeepSeek, Zhipu, local gateways, ...).
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: String, model: String) -> Result<Self, LlmError> {
        Self::with_timeouts(base_url, api_key, model, TimeoutPolicy::default())
    }

    pub fn with_timeouts(
        base_url: &str,
        api_key: String,
        model: String,
        timeouts: TimeoutPolicy,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| LlmError::Unknown(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: build_endpoint(base_url),
            api_key,
            model,
        })
    }

    /// Send one chat-completion request and return the generated text.
    ///
    /// Temperature is fixed at 0.7; one call, one classified result,
    /// no retries.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn send(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.7,
        };

        debug!(endpoint = %self.endpoint, "Sending chat-completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {
                let body = response.text().await.map_err(classify_transport)?;
                let parsed: ChatResponse = serde_json::from_str(&body)
                    .map_err(|e| LlmError::Parse(e.to_string()))?;

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| LlmError::Parse("response contained no choices".to_string()))
            }
            401 | 403 => Err(LlmError::Authentication),
            429 => Err(LlmError::QuotaExceeded),
            400..=499 => {
                let body = response.text().await.unwrap_or_default();
                Err(LlmError::Api {
                    status,
                    message: body,
                })
            }
            500..=599 => Err(LlmError::Api {
                status,
                message: "server error, retry later".to_string(),
            }),
            _ => Err(LlmError::Api {
                status,
                message: "unrecognized status".to_string(),
            }),
        }
    }

    /// Issue a minimal request down the same path as [`send`](Self::send).
    ///
    /// Failures propagate as the underlying classified error so callers can
    /// display the specific cause rather than a bare boolean.
    pub async fn test_connection(&self) -> Result<(), LlmError> {
        let (system, user) = build_test_prompt();
        self.send(&system, &user).await.map(|_| ())
    }
}

/// Map transport-level reqwest failures onto the error taxonomy.
fn classify_transport(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        if err.is_connect() {
            LlmError::ConnectionTimeout(err)
        } else {
            LlmError::RequestTimeout(err)
        }
    } else if err.is_connect() {
        // Covers refused connections and name-resolution failures
        LlmError::Network(err)
    } else if err.is_decode() || err.is_body() {
        LlmError::Parse(err.to_string())
    } else if err.is_request() {
        LlmError::Network(err)
    } else {
        LlmError::Unknown(err.to_string())
    }
}

fn build_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/chat/completions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_endpoint_appends_suffix() {
        assert_eq!(
            build_endpoint("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_endpoint_strips_trailing_slash() {
        assert_eq!(
            build_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_endpoint_keeps_existing_suffix() {
        assert_eq!(
            build_endpoint("https://gateway.local/v1/chat/completions"),
            "https://gateway.local/v1/chat/completions"
        );
        assert_eq!(
            build_endpoint("https://gateway.local/v1/chat/completions/"),
            "https://gateway.local/v1/chat/completions"
        );
    }

    #[test]
    fn test_timeout_policy_defaults() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.connect, Duration::from_secs(10));
        assert_eq!(policy.request, Duration::from_secs(60));
    }
}
