//! Chat gateway: one chat-completion call per question.
//!
//! [`ChatGateway`] is the seam the [`Tutor`](crate::tutor::Tutor) talks to;
//! [`OpenAIChat`] implements it against `POST {api_base}/chat/completions`.
//! Failures come back as [`ChatError`] so the ask handler can turn them into
//! an error response instead of a crashed request.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use tutorbot_core::prompt::ChatMessage;

use crate::config::{ChatConfig, ProviderConfig};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(String),

    #[error("chat API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),
}

/// Sends composed messages to a chat model and returns its reply.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError>;
}

/// Chat-completion client for the OpenAI API and compatible servers.
pub struct OpenAIChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(
        provider: &ProviderConfig,
        config: &ChatConfig,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/chat/completions",
                provider.api_base.trim_end_matches('/')
            ),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatGateway for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError> {
        debug!(url = %self.url, model = %self.model, "Sending chat completion request");

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_output_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        parse_chat_response(&json)
    }
}

/// Pull `choices[0].message.content`, trimmed.
fn parse_chat_response(json: &serde_json::Value) -> Result<String, ChatError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|c| c.trim().to_string())
        .ok_or_else(|| ChatError::InvalidResponse("missing choices[0].message.content".to_string()))
}
