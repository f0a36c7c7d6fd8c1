// src/extraction/completion_client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::CompletionConfig;

/// Something that turns a system instruction plus user text into free text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

/// Chat-completions client speaking the OpenAI wire format
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &CompletionConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Missing OpenAI API key")?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        info!("Sending completion request with model {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to completion API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API error {}: {}", status, error_text);
            anyhow::bail!("Completion API returned error {}: {}", status, error_text);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion API response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Completion API returned no choices")
    }
}
