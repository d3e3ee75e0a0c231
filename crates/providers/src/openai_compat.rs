//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, DeepSeek, xAI Grok, and any other endpoint exposing
//! `/chat/completions` with function calling.
//!
//! Supports:
//! - Chat completions (non-streaming)
//! - Tool use / function calling, with JSON-string arguments decoded on
//!   receipt and re-encoded on replay

use async_trait::async_trait;
use newsroom_core::error::ProviderError;
use newsroom_core::message::{Message, Role};
use newsroom_core::provider::*;
use newsroom_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const GROK_BASE_URL: &str = "https://api.x.ai/v1";

/// An OpenAI-compatible LLM provider.
///
/// One struct serves every backend that speaks the chat completions dialect;
/// only the name, base URL and default model differ.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    default_model: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider. No network call is made.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
        model: Option<String>,
    ) -> Result<Self, ProviderError> {
        let default_model = default_model.into();
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| default_model.clone()),
            default_model,
            client: http::build_client()?,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: Option<String>) -> Result<Self, ProviderError> {
        Self::new("openai", OPENAI_BASE_URL, api_key, "gpt-4o", model)
    }

    /// Create a DeepSeek provider (convenience constructor).
    pub fn deepseek(
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> Result<Self, ProviderError> {
        Self::new(
            "deepseek",
            DEEPSEEK_BASE_URL,
            api_key,
            "deepseek-reasoner",
            model,
        )
    }

    /// Create an xAI Grok provider (convenience constructor).
    pub fn grok(api_key: impl Into<String>, model: Option<String>) -> Result<Self, ProviderError> {
        Self::new("grok", GROK_BASE_URL, api_key, "grok-beta", model)
    }

    /// Override the base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.to_string(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
                name: m.tool_name.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Decode a function-call argument string. Invalid JSON becomes `{}`.
    fn decode_arguments(provider: &str, tool: &str, raw: &str) -> serde_json::Value {
        if raw.trim().is_empty() {
            return serde_json::json!({});
        }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(provider, tool, error = %e, "Tool call arguments are not valid JSON, using {{}}");
                serde_json::json!({})
            }
        }
    }

    fn response_to_provider_response(
        &self,
        api_response: ApiResponse,
    ) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                arguments: Self::decode_arguments(
                    &self.name,
                    &tc.function.name,
                    &tc.function.arguments,
                ),
                id: tc.id,
                name: tc.function.name,
            })
            .collect();

        let content = choice.message.content.unwrap_or_default();
        let finish_reason = choice.finish_reason.as_deref();

        let outcome = if !tool_calls.is_empty() && finish_reason != Some("stop") {
            TurnOutcome::ToolCallsRequested(tool_calls.clone())
        } else if !content.trim().is_empty() {
            TurnOutcome::FinalText(content.clone())
        } else {
            TurnOutcome::NoUsableResponse
        };

        debug!(provider = %self.name, finish_reason = ?finish_reason, "Received completion");

        let mut message = Message::assistant(content);
        message.tool_calls = tool_calls;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            outcome,
            usage,
            model: api_response.model,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        http::merge_extra(&mut body, &request.extra);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let api_response: ApiResponse = http::send_json(
            &self.name,
            self.client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body),
        )
        .await?;

        self.response_to_provider_response(api_response)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
