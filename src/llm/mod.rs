//! LLM access: chat completion client, prompt library and query generation.

pub mod chat;
pub mod prompts;
pub mod query_gen;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::models::ChatMessage;

/// Anything that can turn a role-tagged conversation into assistant text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat backend talking to the configured hosted provider over HTTP.
pub struct HttpChatBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpChatBackend {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        chat::complete(&self.client, &self.config, messages).await
    }
}
