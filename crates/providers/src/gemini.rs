//! Google Gemini provider implementation.
//!
//! Speaks the `generateContent` REST endpoint directly:
//! - `x-goog-api-key` header authentication
//! - System prompt as `systemInstruction`
//! - Roles `user` / `model`; tool results travel as `functionResponse` parts
//! - Tools declared through `functionDeclarations`
//!
//! Gemini does not always issue call ids, so calls without one get a
//! generated id for correlation inside the tool loop.

use async_trait::async_trait;
use newsroom_core::error::ProviderError;
use newsroom_core::message::{Message, Role};
use newsroom_core::provider::*;
use newsroom_core::tool::{ToolCall, ToolDefinition};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::http;

pub const PROVIDER_NAME: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider. No network call is made.
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            client: http::build_client()?,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build `systemInstruction` and `contents` from the conversation.
    fn to_api_contents(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{"text": msg.content}],
                })),
                Role::Assistant => {
                    if let Some(raw) = msg.raw_content_for(PROVIDER_NAME) {
                        contents.push(raw.clone());
                        continue;
                    }
                    let mut parts: Vec<Value> = Vec::new();
                    if !msg.content.is_empty() {
                        parts.push(json!({"text": msg.content}));
                    }
                    for tc in &msg.tool_calls {
                        parts.push(json!({
                            "functionCall": {"name": tc.name, "args": tc.arguments}
                        }));
                    }
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                Role::Tool => {
                    let part = json!({
                        "functionResponse": {
                            "name": msg.tool_name.clone().unwrap_or_default(),
                            "response": {"content": msg.content},
                        }
                    });
                    // Results for one model turn share a single user content
                    if let Some(last) = contents.last_mut() {
                        if is_function_response_content(last) {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                                continue;
                            }
                        }
                    }
                    contents.push(json!({"role": "user", "parts": [part]}));
                }
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(json!({"parts": [{"text": system_parts.join("\n\n")}]}))
        };

        (system, contents)
    }

    /// Convert tool definitions to a single `functionDeclarations` tool.
    fn to_api_tools(tools: &[ToolDefinition]) -> Value {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        json!([{"functionDeclarations": declarations}])
    }

    fn build_body(request: &ProviderRequest) -> Value {
        let (system, contents) = Self::to_api_contents(&request.messages);

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature,
            },
        });

        if let Some(system) = system {
            body["systemInstruction"] = system;
        }

        if !request.tools.is_empty() {
            body["tools"] = Self::to_api_tools(&request.tools);
        }

        http::merge_extra(&mut body, &request.extra);
        body
    }

    fn response_to_provider_response(
        resp: GeminiResponse,
        requested_model: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".into()))?;

        let raw_content = candidate
            .content
            .unwrap_or_else(|| json!({"role": "model", "parts": []}));

        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(parts) = raw_content["parts"].as_array() {
            for part in parts {
                if let Some(text) = part["text"].as_str() {
                    // Thought summaries are not part of the answer
                    if part["thought"].as_bool() == Some(true) {
                        continue;
                    }
                    text_content.push_str(text);
                } else if let Some(call) = part.get("functionCall") {
                    tool_calls.push(ToolCall {
                        id: call["id"]
                            .as_str()
                            .map(String::from)
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                        name: call["name"].as_str().unwrap_or_default().to_string(),
                        arguments: call.get("args").cloned().unwrap_or_else(|| json!({})),
                    });
                }
            }
        }

        let outcome = if !tool_calls.is_empty() {
            TurnOutcome::ToolCallsRequested(tool_calls.clone())
        } else if !text_content.trim().is_empty()
            && matches!(candidate.finish_reason.as_deref(), Some("STOP") | None)
        {
            TurnOutcome::FinalText(text_content.clone())
        } else {
            TurnOutcome::NoUsableResponse
        };

        let mut message =
            Message::assistant(text_content).with_raw_content(PROVIDER_NAME, raw_content);
        message.tool_calls = tool_calls;

        let usage = resp.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            message,
            outcome,
            usage,
            model: resp
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

fn is_function_response_content(content: &Value) -> bool {
    content["role"] == "user"
        && content["parts"].as_array().is_some_and(|parts| {
            !parts.is_empty() && parts.iter().all(|p| p.get("functionResponse").is_some())
        })
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let body = Self::build_body(&request);

        debug!(provider = PROVIDER_NAME, model = %request.model, "Sending completion request");

        let resp: GeminiResponse = http::send_json(
            PROVIDER_NAME,
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&body),
        )
        .await?;

        Self::response_to_provider_response(resp, &request.model)
    }
}

// --- Gemini API types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn parse(json: Value) -> ProviderResponse {
        let resp: GeminiResponse = serde_json::from_value(json).unwrap();
        GeminiProvider::response_to_provider_response(resp, DEFAULT_MODEL).unwrap()
    }

    #[test]
    fn constructor_defaults() {
        let provider = GeminiProvider::new("g-key", None).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.0-flash-exp");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn contents_use_model_role_and_system_instruction() {
        let messages = vec![
            Message::system("You are an editor"),
            Message::user("Write"),
            Message::assistant("Draft"),
        ];
        let (system, contents) = GeminiProvider::to_api_contents(&messages);
        assert_eq!(
            system.unwrap()["parts"][0]["text"],
            "You are an editor"
        );
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Draft");
    }

    #[test]
    fn tool_results_group_into_one_content() {
        let raw = json!({"role": "model", "parts": [
            {"functionCall": {"name": "web_search", "args": {"query": "a"}}},
            {"functionCall": {"name": "web_search", "args": {"query": "b"}}}
        ]});
        let messages = vec![
            Message::user("go"),
            Message::assistant("").with_raw_content("gemini", raw.clone()),
            Message::tool_result("id-a", "web_search", "result a"),
            Message::tool_result("id-b", "web_search", "result b"),
        ];
        let (_, contents) = GeminiProvider::to_api_contents(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], raw);
        let parts = contents[2]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["functionResponse"]["name"], "web_search");
        assert_eq!(parts[1]["functionResponse"]["response"]["content"], "result b");
    }

    #[test]
    fn tools_render_as_function_declarations() {
        let tools = vec![ToolDefinition {
            name: "web_search".into(),
            description: "Search".into(),
            parameters: json!({"type": "object"}),
        }];
        let rendered = GeminiProvider::to_api_tools(&tools);
        assert_eq!(rendered[0]["functionDeclarations"][0]["name"], "web_search");
    }

    #[test]
    fn function_call_parts_become_tool_calls() {
        let pr = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "web_search", "args": {"query": "gemini"}}},
                    {"functionCall": {"id": "fc-2", "name": "web_search", "args": {"query": "two"}}}
                ]},
                "finishReason": "STOP"
            }]
        }));
        match pr.outcome {
            TurnOutcome::ToolCallsRequested(calls) => {
                assert_eq!(calls.len(), 2);
                assert!(!calls[0].id.is_empty());
                assert_eq!(calls[0].arguments["query"], "gemini");
                assert_eq!(calls[1].id, "fc-2");
                assert_ne!(calls[0].id, calls[1].id);
            }
            other => panic!("Expected tool calls, got {other:?}"),
        }
        assert!(pr.message.raw_content_for("gemini").is_some());
    }

    #[test]
    fn text_with_stop_is_final() {
        let pr = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Part one. "}, {"text": "Part two."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10}
        }));
        assert_eq!(pr.outcome, TurnOutcome::FinalText("Part one. Part two.".into()));
        assert_eq!(pr.usage.unwrap().total_tokens, 10);
        assert_eq!(pr.model, DEFAULT_MODEL);
    }

    #[test]
    fn safety_stop_is_not_usable() {
        let pr = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "partial"}]},
                "finishReason": "SAFETY"
            }]
        }));
        assert_eq!(pr.outcome, TurnOutcome::NoUsableResponse);
        assert_eq!(pr.message.content, "partial");
    }

    #[test]
    fn missing_candidates_is_invalid() {
        let resp: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        let err = GeminiProvider::response_to_provider_response(resp, DEFAULT_MODEL).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({
                "generationConfig": {"maxOutputTokens": 8000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Gemini digest"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("g-key", None)
            .unwrap()
            .with_base_url(server.uri());
        let text = provider
            .generate(
                vec![Message::user("Summarize")],
                GenerateOptions::default().with_max_tokens(8000),
            )
            .await
            .unwrap();
        assert_eq!(text, "Gemini digest");
    }
}
