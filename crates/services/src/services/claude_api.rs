//! Claude API client used for architecture and artifact generation.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Error)]
pub enum ClaudeApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,
}

impl ClaudeApiError {
    /// Transient failures worth retrying. Anything the caller did wrong
    /// (4xx, bad key, bad payload) is not.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// One turn of the conversation, in the Messages API wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

/// Response content block. Only text blocks are requested, so only text
/// blocks are modeled.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

impl MessagesResponse {
    /// First text block of the response, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ClaudeApiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl ClaudeApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Build a client from `ANTHROPIC_API_KEY`. A missing key is tolerated
    /// at construction; calls fail with [`ClaudeApiError::MissingApiKey`]
    /// until one is configured.
    pub fn from_env(model: Option<String>) -> Result<Self, ClaudeApiError> {
        Self::new(std::env::var("ANTHROPIC_API_KEY").ok(), model)
    }

    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, ClaudeApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("archforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClaudeApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: CLAUDE_API_URL.to_string(),
        })
    }

    /// Point the client at a different messages endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one completion, retrying transient failures with jittered
    /// exponential backoff.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<MessagesResponse, ClaudeApiError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            messages,
            system,
        };

        (|| async { self.send_request(&request).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &ClaudeApiError| e.should_retry())
            .notify(|e, dur| warn!("claude call failed, retrying in {:.1}s: {e}", dur.as_secs_f64()))
            .await
    }

    async fn send_request(
        &self,
        request: &MessagesRequest,
    ) -> Result<MessagesResponse, ClaudeApiError> {
        let api_key = self.api_key.as_deref().ok_or(ClaudeApiError::MissingApiKey)?;
        let res = self
            .http
            .post(&self.base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClaudeApiError::InvalidApiKey);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClaudeApiError::RateLimited);
        }
        if !status.is_success() {
            return Err(ClaudeApiError::Http {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        res.json::<MessagesResponse>()
            .await
            .map_err(|e| ClaudeApiError::Serde(e.to_string()))
    }

    /// One-shot prompt: single user message in, response text out.
    pub async fn ask(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<String, ClaudeApiError> {
        let response = self
            .complete(vec![Message::user(prompt)], system, max_tokens)
            .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| ClaudeApiError::Serde("no text content in response".to_string()))
    }

    /// One-shot prompt whose answer is parsed as JSON, with the usual
    /// markdown fence tolerated.
    pub async fn ask_json<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<T, ClaudeApiError> {
        let response = self.ask(prompt, system, max_tokens).await?;
        if response.trim().is_empty() {
            return Err(ClaudeApiError::Serde("empty response".to_string()));
        }

        let json_str = extract_json(&response);
        serde_json::from_str(json_str).map_err(|e| {
            tracing::error!(
                json_error = %e,
                preview = %json_str.chars().take(500).collect::<String>(),
                "completion did not parse as json"
            );
            ClaudeApiError::Serde(format!(
                "{e} (response preview: {})",
                json_str.chars().take(500).collect::<String>()
            ))
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClaudeApiError {
    if e.is_timeout() {
        ClaudeApiError::Timeout
    } else {
        ClaudeApiError::Transport(e.to_string())
    }
}

/// Body of the first fenced block opened by `opener`, with any language tag
/// on the opening line skipped. `close_from_end` scans for the closing
/// fence backward from the end, which keeps backticks inside the body.
fn fence_body<'a>(text: &'a str, opener: &str, close_from_end: bool) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let body_start = text[start..]
        .find('\n')
        .map(|i| start + i + 1)
        .unwrap_or(start);
    let rest = &text[body_start..];
    let end = if close_from_end {
        rest.rfind("```")?
    } else {
        rest.find("```")?
    };
    Some(rest[..end].trim())
}

/// JSON payload of a response that may wrap it in a markdown fence. An
/// unfenced response is returned whole.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    fence_body(text, "```json", false)
        .or_else(|| fence_body(text, "```", false))
        .unwrap_or(text)
}

/// Source payload of a response that may wrap it in a fence ("```jsx",
/// "```ts", ...). The closing fence is taken from the end so template
/// literals inside the code survive.
pub fn extract_code(text: &str) -> &str {
    let text = text.trim();
    fence_body(text, "```", true).unwrap_or(text)
}
