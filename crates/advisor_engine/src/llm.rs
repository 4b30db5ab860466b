//! Chat-completion collaborator: prompt pair -> raw model text.
//!
//! No retries here: a failed call surfaces as an error and the pipeline
//! short-circuits to the fallback synthesizer.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use advisor_common::config::LlmSettings;

/// Black-box language-model gateway. The returned text carries no
/// well-formedness guarantee; the response parser must tolerate anything.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Gateway over an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpChatGateway {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpChatGateway {
    pub fn new(settings: &LlmSettings, api_key: &str) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmGateway for HttpChatGateway {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!(
            "[>]  LLM CALL [{}] ({} system chars, {} user chars)",
            self.model,
            system_prompt.len(),
            user_prompt.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API returned error {}: {}", status, error_text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Chat completion contained no choices")?;

        info!("[<]  LLM RESPONSE ({} chars)", content.len());
        Ok(content.trim().to_string())
    }
}

/// Deterministic gateway returning pre-configured text. Used by tests and
/// offline demos, the same way a fake probe executor stands in for shell
/// commands.
pub struct ScriptedGateway {
    response: String,
}

impl ScriptedGateway {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
