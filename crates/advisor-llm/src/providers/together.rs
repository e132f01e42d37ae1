//! Together AI provider implementation
//!
//! Together exposes the OpenAI-compatible chat-completions wire format:
//! POST `{api_base}/chat/completions` with a bearer token, a JSON body of
//! `{model, messages, max_tokens, temperature}`, and the generated text at
//! `choices[0].message.content`.
//!
//! Any OpenAI-compatible endpoint works through a custom `api_base`, so the
//! same provider covers local deployments (llama.cpp, vLLM) and proxies.
//!
//! # Examples
//!
//! ```no_run
//! use advisor_llm::{ChatProvider, CompletionRequest, Message};
//! use advisor_llm::providers::TogetherProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create provider from the TOGETHER_API_KEY environment variable
//!     let provider = TogetherProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder("mistralai/Mixtral-8x7B-Instruct-v0.1")
//!         .system("You are a helpful financial analyst.")
//!         .add_message(Message::user("Is AAPL a good buy?"))
//!         .max_tokens(500)
//!         .temperature(0.7)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!
//!     Ok(())
//! }
//! ```

use crate::{
    ChatProvider, CompletionError, CompletionRequest, CompletionResponse, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_TOGETHER_API_BASE: &str = "https://api.together.xyz/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Together provider
#[derive(Debug, Clone)]
pub struct TogetherConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: "https://api.together.xyz/v1")
    /// Can point at any OpenAI-compatible endpoint.
    pub api_base: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl TogetherConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_TOGETHER_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `TOGETHER_API_KEY` and, if set, the base URL
    /// from `TOGETHER_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TOGETHER_API_KEY").map_err(|_| {
            CompletionError::ConfigurationError(
                "TOGETHER_API_KEY environment variable not set".to_string(),
            )
        })?;

        let api_base = std::env::var("TOGETHER_API_BASE")
            .unwrap_or_else(|_| DEFAULT_TOGETHER_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set a custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Together AI chat-completion provider
pub struct TogetherProvider {
    client: Client,
    config: TogetherConfig,
}

impl TogetherProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: TogetherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(TogetherConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        let config = TogetherConfig::from_env()?;
        Self::with_config(config)
    }

    /// Get the current configuration
    pub fn config(&self) -> &TogetherConfig {
        &self.config
    }
}

#[async_trait]
impl ChatProvider for TogetherProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        // System prompt goes into the messages array on the wire
        let wire_messages = build_wire_messages(request.system.clone(), &request.messages);

        let wire_request = WireRequest {
            model: request.model.clone(),
            messages: wire_messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => CompletionError::AuthenticationFailed,
                429 => CompletionError::RateLimitExceeded(error_text),
                400 => CompletionError::InvalidRequest(error_text),
                404 => CompletionError::ModelNotFound(request.model),
                _ => CompletionError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let wire_response: WireResponse = response.json().await.map_err(|e| {
            CompletionError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        // The endpoint can return multiple choices; the advisor uses the first
        let choice = wire_response.choices.into_iter().next().ok_or_else(|| {
            CompletionError::UnexpectedResponse("No choices in response".to_string())
        })?;

        let usage = wire_response.usage.unwrap_or_default();

        debug!(
            "Received response - finish_reason: {}, tokens: {}/{}",
            choice.finish_reason.as_deref().unwrap_or("unknown"),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        let content = choice.message.content.ok_or_else(|| {
            CompletionError::UnexpectedResponse("Choice has no message content".to_string())
        })?;

        Ok(CompletionResponse {
            message: Message::assistant(content),
            stop_reason: map_stop_reason(choice.finish_reason.as_deref()),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "together"
    }
}

fn build_wire_messages(system: Option<String>, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system {
        wire.push(WireMessage {
            role: "system".to_string(),
            content: system,
        });
    }

    for message in messages {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        wire.push(WireMessage {
            role: role.to_string(),
            content: message.content.clone(),
        });
    }

    wire
}

fn map_stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("length") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

// ============================================================================
// Wire format types
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TogetherConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.api_base, DEFAULT_TOGETHER_API_BASE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_customization() {
        let config = TogetherConfig::new("test-key")
            .with_api_base("http://localhost:8000/v1")
            .with_timeout(60);
        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_build_wire_messages_prepends_system() {
        let wire = build_wire_messages(
            Some("You are a helpful financial analyst.".to_string()),
            &[Message::user("Is AAPL a good buy?")],
        );
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content, "You are a helpful financial analyst.");
        assert_eq!(wire[1].role, "user");
    }

    #[test]
    fn test_wire_request_serialization() {
        let request = WireRequest {
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            max_tokens: 500,
            temperature: Some(0.7),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_wire_response_parsing() {
        let json = r#"{
            "choices": [
                {
                    "message": {"role": "assistant", "content": "Recommendation: Buy."},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        }"#;
        let response: WireResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("Recommendation: Buy.")
        );
    }

    #[test]
    fn test_map_stop_reason() {
        assert_eq!(map_stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(None), StopReason::EndTurn);
    }
}
