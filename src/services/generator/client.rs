//! Text-generation collaborator.
//!
//! `TextGenerator` is the seam the generator talks to. `OpenAiClient` is the
//! production implementation: one chat completion per request over HTTPS.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CogniError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with the default sampling settings.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Anything that turns a prompt into a single completion.
///
/// Failures of the call itself (network, auth, quota) are reported as
/// `CogniError::Generation`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: [ChatMessage; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat-completions client.
///
/// Uses the blocking `reqwest` client inside `smol::unblock`.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    endpoint: Url,
    http: reqwest::blocking::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl OpenAiClient {
    /// Client for the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Client for an OpenAI-compatible endpoint (`.../v1`).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .and_then(|url| url.join("chat/completions"))
            .map_err(|e| CogniError::Configuration(format!("Invalid OpenAI base URL {}: {}", base_url, e)))?;

        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| CogniError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Blocking round trip.
    fn send(&self, body: ChatRequest) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| CogniError::Generation(format!("OpenAI API error: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| CogniError::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(CogniError::Generation(format!(
                "OpenAI API error {}: {}",
                status, text
            )));
        }

        parse_completion(&text)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.request_body(request);
        let client = self.clone();
        tracing::debug!("Requesting completion from {} ({})", client.endpoint, client.model);
        smol::unblock(move || client.send(body)).await
    }
}

/// Extract the first choice's text from a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CogniError::Generation(format!("Failed to parse OpenAI response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| CogniError::Generation("No completion in OpenAI response".to_string()))
}
