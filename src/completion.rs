//! Chat-completion provider abstraction.
//!
//! Translation and commentary are produced by an external language model.
//! This module defines the [`CompletionProvider`] trait and its concrete
//! implementations:
//! - **[`DisabledProvider`]** — returns errors; used when no provider is configured.
//! - **[`OpenAIProvider`]** — calls an OpenAI-compatible `/chat/completions`
//!   endpoint with timeout, retry, and backoff.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the provider named in the
//! configuration:
//!
//! ```rust,no_run
//! # use preach_point::config::CompletionConfig;
//! # use preach_point::completion::create_provider;
//! let config = CompletionConfig {
//!     provider: "disabled".to_string(),
//!     ..CompletionConfig::default()
//! };
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, ... capped at 32s
//! - `completion.max_retries` counts retries, so `0` means a single attempt

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::CompletionConfig;

/// A single system + user prompt exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Backend that turns a prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider identifier (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Runs the completion and returns the trimmed response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Instantiates the provider named by `config.provider`.
///
/// # Errors
///
/// Fails for an unknown provider, or for `openai` without an API key.
pub fn create_provider(config: &CompletionConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledProvider)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A no-op provider that always returns errors.
pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        bail!("completion provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// Provider using the OpenAI chat completions API.
///
/// Reads the API key from `OPENAI_KEY`, falling back to `OPENAI_API_KEY`.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAIProvider {
    /// # Errors
    ///
    /// Returns an error if neither key variable is set or the HTTP client
    /// cannot be built.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("Missing OpenAI key: set OPENAI_KEY or OPENAI_API_KEY")
            })?;

        Self::with_key(config, api_key)
    }

    /// Builds a provider with an explicit key.
    pub fn with_key(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = chat_body(request);
        let attempts = self.max_retries.saturating_add(1);

        let mut attempt = 1;
        loop {
            let err = match self.post_chat(&body).await {
                ChatOutcome::Answer(text) => return Ok(text),
                ChatOutcome::Rejected(err) => return Err(err),
                ChatOutcome::Transient(err) => err,
            };

            if attempt >= attempts {
                return Err(err.context(format!(
                    "chat completion with {} gave up after {} attempt(s)",
                    request.model, attempts
                )));
            }

            let delay = retry_delay(attempt);
            tracing::warn!(
                model = %request.model,
                attempt,
                ?delay,
                error = %err,
                "chat completion failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Result of a single `/chat/completions` round trip.
enum ChatOutcome {
    Answer(String),
    /// Worth another attempt: network failure, 429, or 5xx.
    Transient(anyhow::Error),
    /// The request itself is bad; resending cannot help.
    Rejected(anyhow::Error),
}

impl OpenAIProvider {
    async fn post_chat(&self, body: &serde_json::Value) -> ChatOutcome {
        let sent = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(err) => return ChatOutcome::Transient(err.into()),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<serde_json::Value>().await {
                Ok(json) => match parse_chat_response(&json) {
                    Ok(text) => ChatOutcome::Answer(text),
                    Err(err) => ChatOutcome::Rejected(err),
                },
                Err(err) => ChatOutcome::Transient(err.into()),
            };
        }

        let detail = response.text().await.unwrap_or_default();
        let err = anyhow::anyhow!("chat completions returned {}: {}", status, detail);
        if is_transient(status) {
            ChatOutcome::Transient(err)
        } else {
            ChatOutcome::Rejected(err)
        }
    }
}

fn is_transient(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Pause before retry number `attempt` (1-based): 1s, 2s, 4s, ... capped at 32s.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(5))
}

fn chat_body(request: &CompletionRequest) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.prompt },
        ],
        "temperature": request.temperature,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    body
}

/// Extracts `choices[0].message.content` from a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;

    Ok(content.trim().to_string())
}
