//! Wire access to the chat-completion endpoint.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::config::Credentials;

/// Sampling temperature for every request. Responses are machine-parsed, so
/// sampling is kept near-deterministic.
pub const TEMPERATURE: f32 = 0.1;

/// One prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    /// Full instruction: task contract plus embedded payload.
    pub prompt: String,
    pub max_tokens: u32,
}

/// Failures below the contract layer. Never retried by the client.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response carried no completion text")]
    EmptyCompletion,

    #[error("Client is shut down")]
    Closed,
}

/// Performs a single request/response round trip.
///
/// Implementations return the raw completion text; contract validation
/// happens in [`super::CompletionClient`].
#[async_trait]
pub trait CompletionTransport: Send + Sync + Debug {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}

/// OpenAI compatible chat-completions transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Chat-completions URL.
    endpoint: String,
    /// Bearer credential.
    credentials: Credentials,
    /// Shared connection pool.
    client: Client,
}

impl HttpTransport {
    /// # Errors
    /// Returns `TransportError::Http` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Result<Self, TransportError> {
        let client = Client::builder().connect_timeout(Duration::from_secs(30)).build()?;
        Ok(Self { endpoint: endpoint.into(), credentials, client })
    }
}

/// Request body of the chat-completions endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    /// Model identifier.
    model: &'a str,
    /// Single user-role message.
    messages: [ChatMessage<'a>; 1],
    /// Sampling temperature.
    temperature: f32,
    /// Output size limit.
    max_tokens: u32,
}

/// A chat message in a request.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// Always `"user"`.
    role: &'a str,
    /// Instruction text.
    content: &'a str,
}

/// Response body of the chat-completions endpoint (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Generated alternatives; the first one is used.
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// One generated alternative.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// Generated message.
    message: ChatChoiceMessage,
}

/// Generated message payload.
#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    /// Completion text; absent for refusals or tool calls.
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [ChatMessage { role: "user", content: &request.prompt }],
            temperature: TEMPERATURE,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credentials.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TransportError::EmptyCompletion)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn chat_request_wire_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [ChatMessage { role: "user", content: "Translate" }],
            temperature: TEMPERATURE,
            max_tokens: 100,
        };

        let value = serde_json::to_value(&body).unwrap();

        assert_that!(value["model"], eq(&json!("gpt-4o-mini")));
        assert_that!(value["messages"][0]["role"], eq(&json!("user")));
        assert_that!(value["messages"][0]["content"], eq(&json!("Translate")));
        assert_that!(value["max_tokens"], eq(&json!(100)));
    }

    #[rstest]
    fn chat_response_reads_first_choice() {
        let raw = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hola"}}]}"#;

        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();

        assert_that!(parsed.choices[0].message.content, some(eq("Hola")));
    }

    #[rstest]
    fn chat_response_tolerates_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant"}}]}"#).unwrap();

        assert_that!(parsed.choices[0].message.content, none());
    }
}
