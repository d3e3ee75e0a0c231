//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to one backend and fold the
//! backend's response shape into a [`TurnOutcome`]. Everything above this
//! trait (the tool loop, the digest pipeline) is backend-agnostic.
//!
//! Implementations: Anthropic Messages, OpenAI-compatible chat completions
//! (OpenAI, DeepSeek, xAI), Google Gemini.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition, ToolHandler};

/// A single request to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-sonnet-4-5-20250929", "gpt-4o")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Backend-specific fields merged into the request body as-is
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_temperature() -> f32 {
    1.0
}

/// The three things a backend turn can mean to the tool loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model answered; the text is final.
    FinalText(String),
    /// The model wants these tools run before it continues.
    ToolCallsRequested(Vec<ToolCall>),
    /// Neither a final answer nor a usable tool request (truncation, refusal,
    /// unknown stop reason).
    NoUsableResponse,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// The generated assistant message, including any raw provider content
    pub message: Message,

    /// Normalized meaning of this turn
    pub outcome: TurnOutcome,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Options for a single-turn [`Provider::generate`] call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: default_temperature(),
            extra: serde_json::Map::new(),
        }
    }
}

impl GenerateOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Add a backend-specific body field.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Options for [`Provider::generate_with_tools`].
#[derive(Debug, Clone)]
pub struct ToolLoopOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Hard cap on request/response round-trips
    pub max_iterations: u32,
}

impl Default for ToolLoopOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: default_temperature(),
            max_iterations: 8,
        }
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements [`complete`](Provider::complete); the
/// single-turn and tool-loop entry points are built on top of it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identity as used in configuration (e.g., "claude", "deepseek").
    fn name(&self) -> &str;

    /// The backend's default model.
    fn default_model(&self) -> &str;

    /// The resolved model this provider sends requests with.
    fn model(&self) -> &str;

    /// Send one request and normalize the response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Single-turn generation. Fails if the backend returns no usable text.
    async fn generate(
        &self,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model().to_string(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools: Vec::new(),
            extra: options.extra,
        };

        let response = self.complete(request).await?;
        let text = response.message.content;
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: self.name().to_string(),
            });
        }
        Ok(text)
    }

    /// Generation with tool calling; drives the bounded tool loop.
    ///
    /// `messages` is extended in place with assistant and tool-result turns.
    async fn generate_with_tools(
        &self,
        messages: &mut Vec<Message>,
        tools: &[ToolDefinition],
        options: ToolLoopOptions,
        handler: &mut dyn ToolHandler,
    ) -> Result<String, ProviderError> {
        crate::tool_loop::run(self, messages, tools, &options, handler).await
    }
}
