//! Text-generation collaborator
//!
//! [`TextGenerator`] abstracts "prompt in, text out". The production
//! implementation, [`ChatCompletionsClient`], talks to any OpenAI-compatible
//! chat completions endpoint (Groq by default). Tests substitute doubles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sophono_common::config::CollaboratorConfig;
use thiserror::Error;
use tracing::debug;

/// Errors from the text-generation collaborator
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("No API key configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    /// Options for the song assessment
    pub fn music(config: &CollaboratorConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.music_temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Options for the lyrics assessment
    pub fn lyrics(config: &CollaboratorConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.lyrics_temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Single-shot generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// One user message with the given options
    pub fn user_prompt(prompt: impl Into<String>, options: &GenerationOptions) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            options: options.clone(),
        }
    }
}

/// Prompt in, text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name, reported by the health endpoint
    fn name(&self) -> &str;

    /// Whether requests can be attempted at all (e.g. credentials present)
    fn is_configured(&self) -> bool {
        true
    }

    /// Generate the assistant reply for `request`
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl ChatCompletionsClient {
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.groq.com/openai/v1`
    /// * `api_key` - Bearer token; without one every request fails with `NotConfigured`
    /// * `timeout` - Per-request timeout; `None` waits indefinitely
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Option<Duration>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key,
            timeout,
        }
    }

    /// Build from collaborator settings; `timeout_secs == 0` disables the timeout
    pub fn from_config(config: &CollaboratorConfig, api_key: Option<String>) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(config.base_url.clone(), api_key, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatCompletionRequest {
            model: &request.options.model,
            messages: &request.messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream: false,
        };

        debug!(
            model = %request.options.model,
            temperature = request.options.temperature,
            message_count = request.messages.len(),
            "Sending chat completion request"
        );

        let mut builder = self.client.post(&url).bearer_auth(api_key).json(&body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::InvalidResponse(format!("Failed to parse completion response: {}", e))
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in completion response".to_string()))?;

        debug!(chars = content.len(), "Received chat completion");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::user("hello")];
        let body = ChatCompletionRequest {
            model: "llama3-70b-8192",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 1024,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-70b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"<final>73</final>"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("<final>73</final>"));
    }

    #[test]
    fn test_options_from_config() {
        let config = CollaboratorConfig::default();
        let music = GenerationOptions::music(&config);
        let lyrics = GenerationOptions::lyrics(&config);
        assert_eq!(music.temperature, 0.5);
        assert_eq!(lyrics.temperature, 0.7);
        assert_eq!(music.max_tokens, 1024);
        assert_eq!(music.model, "llama3-70b-8192");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatCompletionsClient::new("https://api.example.com/v1/", None, None);
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = ChatCompletionsClient::from_config(&CollaboratorConfig::default(), None);
        assert!(!client.is_configured());

        let request = GenerationRequest::user_prompt("hi", &GenerationOptions::music(&CollaboratorConfig::default()));
        assert!(matches!(client.generate(&request).await, Err(LlmError::NotConfigured)));
    }
}
