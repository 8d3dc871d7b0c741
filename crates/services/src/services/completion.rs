//! Seam between the pipelines and the hosted model.

use async_trait::async_trait;

use super::claude_api::{ClaudeApiClient, ClaudeApiError, Message};

/// Single-turn text completion. The pipelines only ever need one user
/// message and a system prompt, so the seam is exactly that narrow;
/// anything richer stays on [`ClaudeApiClient`] itself.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<String, ClaudeApiError>;
}

#[async_trait]
impl CompletionClient for ClaudeApiClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<String, ClaudeApiError> {
        let response =
            ClaudeApiClient::complete(self, vec![Message::user(prompt)], system, max_tokens)
                .await?;
        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| ClaudeApiError::Serde("no text content in response".to_string()))
    }
}
