//! Reqwest-backed chat completion adapter for the recommendation assistant.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and decoding the first completion choice.

mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use self::dto::{CompletionRequestDto, CompletionResponseDto};
use crate::domain::ports::{ChatPrompt, TextGenerationError, TextGenerator};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 200;

/// Model parameters sent with every completion.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Text generator calling an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatGenerator {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    options: CompletionOptions,
}

impl OpenAiChatGenerator {
    /// Build a generator for `base_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns a message when the base URL is unusable or the reqwest client
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        options: CompletionOptions,
    ) -> Result<Self, String> {
        let endpoint = completions_endpoint(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            client,
            endpoint,
            api_key: Zeroizing::new(api_key.into()),
            options,
        })
    }
}

fn completions_endpoint(base_url: &str) -> Result<Url, String> {
    let mut base = Url::parse(base_url).map_err(|err| format!("invalid base URL: {err}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|err| format!("invalid base URL: {err}"))
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, TextGenerationError> {
        let body = CompletionRequestDto::from_prompt(
            prompt,
            &self.options.model,
            self.options.temperature,
            self.options.max_tokens,
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|err| TextGenerationError::transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TextGenerationError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        debug!(bytes = bytes.len(), "chat completion received");
        parse_reply(bytes.as_ref())
    }
}

fn parse_reply(body: &[u8]) -> Result<String, TextGenerationError> {
    let decoded: CompletionResponseDto = serde_json::from_slice(body).map_err(|err| {
        TextGenerationError::invalid_response(format!("invalid completion JSON: {err}"))
    })?;
    decoded
        .into_reply()
        .ok_or_else(|| TextGenerationError::invalid_response("completion has no content"))
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TextGenerationError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    TextGenerationError::transport(message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
