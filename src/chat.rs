//! Chat-completion provider abstraction and implementations.
//!
//! The answer loop sends one composed prompt per question as a single
//! user message with `temperature: 0`, so repeated runs over the same
//! index give stable answers. Retry policy matches the embedding client:
//! 429/5xx/network errors back off and retry, other client errors fail
//! the current request.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::embedding::{azure_credentials, post_json_with_retry, AZURE_API_VERSION};

/// A chat-completion backend: one prompt in, generated text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model or deployment identifier, for reporting.
    fn model_name(&self) -> &str;

    /// Send `prompt` as a single-turn user message and return the reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Instantiate the chat model named by the configuration.
pub fn create_chat_model(config: &ChatConfig) -> Result<Box<dyn ChatModel>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiChat::new(config)?)),
        "azure" => Ok(Box::new(AzureOpenAiChat::new(config)?)),
        other => bail!("Unknown chat provider: {}", other),
    }
}

// ============ OpenAI ============

/// Chat backend for `POST https://api.openai.com/v1/chat/completions`.
/// Requires `OPENAI_API_KEY` in the environment.
pub struct OpenAiChat {
    model: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("chat.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
        });

        let json = post_json_with_retry(
            &client,
            "https://api.openai.com/v1/chat/completions",
            ("Authorization", format!("Bearer {}", self.api_key)),
            &body,
            self.max_retries,
        )
        .await?;

        parse_chat_response(&json)
    }
}

// ============ Azure OpenAI ============

/// Chat backend for an Azure OpenAI deployment. Requires
/// `AZURE_OPENAI_API_KEY` and `AZURE_OPENAI_ENDPOINT` in the environment.
pub struct AzureOpenAiChat {
    deployment: String,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl AzureOpenAiChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let deployment = config
            .deployment
            .clone()
            .ok_or_else(|| anyhow::anyhow!("chat.deployment required for Azure provider"))?;
        let (endpoint, api_key) = azure_credentials()?;

        Ok(Self {
            deployment,
            endpoint,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ChatModel for AzureOpenAiChat {
    fn model_name(&self) -> &str {
        &self.deployment
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            AZURE_API_VERSION
        );

        let body = serde_json::json!({
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
        });

        let json = post_json_with_retry(
            &client,
            &url,
            ("api-key", self.api_key.clone()),
            &body,
            self.max_retries,
        )
        .await?;

        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions reply.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            anyhow::anyhow!("Invalid chat response: missing choices[0].message.content")
        })
}
