//! The bounded tool-calling loop.
//!
//! One iteration is one request/response round-trip. Tool results are
//! appended after the assistant turn that requested them, in the order the
//! backend emitted the calls, and each result carries the id of the call it
//! answers. The loop never issues more than `max_iterations` requests.

use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, ToolLoopOptions, TurnOutcome};
use crate::tool::{ToolDefinition, ToolHandler};

/// Drive `provider` until it produces final text or the iteration cap is hit.
///
/// If the loop stops without a final answer, the most recent non-empty
/// assistant text is returned instead; with no text at all it fails.
pub async fn run<P>(
    provider: &P,
    messages: &mut Vec<Message>,
    tools: &[ToolDefinition],
    options: &ToolLoopOptions,
    handler: &mut dyn ToolHandler,
) -> Result<String, ProviderError>
where
    P: Provider + ?Sized,
{
    let mut last_text: Option<String> = None;
    let mut stopped_early = false;

    for iteration in 1..=options.max_iterations {
        debug!(
            provider = provider.name(),
            iteration,
            max_iterations = options.max_iterations,
            messages = messages.len(),
            "Tool loop iteration"
        );

        let request = ProviderRequest {
            model: provider.model().to_string(),
            messages: messages.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools: tools.to_vec(),
            extra: serde_json::Map::new(),
        };

        let response = provider.complete(request).await?;

        if !response.message.content.trim().is_empty() {
            last_text = Some(response.message.content.clone());
        }

        match response.outcome {
            TurnOutcome::FinalText(text) => return Ok(text),
            TurnOutcome::ToolCallsRequested(calls) => {
                messages.push(response.message);

                for call in &calls {
                    info!(
                        provider = provider.name(),
                        tool = %call.name,
                        call_id = %call.id,
                        "Executing tool call"
                    );
                    let output = match handler.handle(call).await {
                        Ok(output) => output,
                        Err(e) => {
                            warn!(tool = %call.name, error = %e, "Tool call failed");
                            format!("Error: {e}")
                        }
                    };
                    messages.push(Message::tool_result(&call.id, &call.name, output));
                }
            }
            TurnOutcome::NoUsableResponse => {
                debug!(provider = provider.name(), iteration, "No usable response, stopping");
                stopped_early = true;
                break;
            }
        }
    }

    match last_text {
        Some(text) => Ok(text),
        None if stopped_early => Err(ProviderError::EmptyResponse {
            provider: provider.name().to_string(),
        }),
        None => Err(ProviderError::ExhaustedIterations {
            max_iterations: options.max_iterations,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ToolError;
    use crate::message::Role;
    use crate::provider::ProviderResponse;
    use crate::tool::ToolCall;

    /// Replays a fixed list of turns and records every request it sees.
    struct ScriptedProvider {
        turns: Mutex<VecDeque<(String, TurnOutcome)>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(turns: Vec<(&str, TurnOutcome)>) -> Self {
            Self {
                turns: Mutex::new(
                    turns
                        .into_iter()
                        .map(|(text, outcome)| (text.to_string(), outcome))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        fn default_model(&self) -> &str {
            "script-1"
        }
        fn model(&self) -> &str {
            "script-1"
        }
        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let (text, outcome) = self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| (String::new(), TurnOutcome::NoUsableResponse));
            let mut message = Message::assistant(text);
            if let TurnOutcome::ToolCallsRequested(calls) = &outcome {
                message.tool_calls = calls.clone();
            }
            Ok(ProviderResponse {
                message,
                outcome,
                usage: None,
                model: "script-1".into(),
            })
        }
    }

    fn call(id: &str, query: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "web_search".into(),
            arguments: serde_json::json!({ "query": query }),
        }
    }

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "web_search".into(),
            description: "Search the web".into(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    fn echo_handler(call: &ToolCall) -> Result<String, ToolError> {
        Ok(format!("results for {}", call.str_arg("query").unwrap_or_default()))
    }

    fn opts(max_iterations: u32) -> ToolLoopOptions {
        ToolLoopOptions {
            max_iterations,
            ..ToolLoopOptions::default()
        }
    }

    #[tokio::test]
    async fn final_text_on_first_turn() {
        let provider = ScriptedProvider::new(vec![(
            "digest",
            TurnOutcome::FinalText("digest".into()),
        )]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let text = run(&provider, &mut messages, &[search_tool()], &opts(8), &mut handler)
            .await
            .unwrap();

        assert_eq!(text, "digest");
        assert_eq!(provider.request_count(), 1);
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn tool_results_follow_their_assistant_turn_in_order() {
        let provider = ScriptedProvider::new(vec![
            (
                "",
                TurnOutcome::ToolCallsRequested(vec![call("a", "first"), call("b", "second")]),
            ),
            ("done", TurnOutcome::FinalText("done".into())),
        ]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let text = run(&provider, &mut messages, &[search_tool()], &opts(8), &mut handler)
            .await
            .unwrap();

        assert_eq!(text, "done");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].tool_calls.len(), 2);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("a"));
        assert_eq!(messages[2].content, "results for first");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("b"));
        assert_eq!(messages[3].content, "results for second");

        // Second request carried the tool results
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].tools.len(), 1);
    }

    #[tokio::test]
    async fn handler_errors_become_tool_results() {
        let provider = ScriptedProvider::new(vec![
            ("", TurnOutcome::ToolCallsRequested(vec![call("x", "q")])),
            ("ok", TurnOutcome::FinalText("ok".into())),
        ]);
        let mut messages = vec![Message::user("go")];
        let mut handler = |_: &ToolCall| -> Result<String, ToolError> {
            Err(ToolError::NotFound("web_search".into()))
        };

        let text = run(&provider, &mut messages, &[search_tool()], &opts(8), &mut handler)
            .await
            .unwrap();

        assert_eq!(text, "ok");
        assert!(messages[2].content.starts_with("Error:"));
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn exhausted_without_text_fails() {
        let provider = ScriptedProvider::new(vec![(
            "",
            TurnOutcome::ToolCallsRequested(vec![call("a", "q")]),
        )]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let err = run(&provider, &mut messages, &[search_tool()], &opts(1), &mut handler)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ExhaustedIterations { max_iterations: 1 }));
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn never_exceeds_max_iterations() {
        let turns = (0..10)
            .map(|i| {
                (
                    "thinking",
                    TurnOutcome::ToolCallsRequested(vec![call(&format!("c{i}"), "q")]),
                )
            })
            .collect();
        let provider = ScriptedProvider::new(turns);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let text = run(&provider, &mut messages, &[search_tool()], &opts(3), &mut handler)
            .await
            .unwrap();

        // Falls back to the last non-empty assistant text
        assert_eq!(text, "thinking");
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn no_usable_response_returns_last_text() {
        let provider = ScriptedProvider::new(vec![
            (
                "partial draft",
                TurnOutcome::ToolCallsRequested(vec![call("a", "q")]),
            ),
            ("", TurnOutcome::NoUsableResponse),
        ]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let text = run(&provider, &mut messages, &[search_tool()], &opts(8), &mut handler)
            .await
            .unwrap();

        assert_eq!(text, "partial draft");
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn no_usable_response_without_text_is_empty_response() {
        let provider = ScriptedProvider::new(vec![("", TurnOutcome::NoUsableResponse)]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let err = run(&provider, &mut messages, &[], &opts(8), &mut handler)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn provider_trait_entry_point_uses_loop() {
        let provider = ScriptedProvider::new(vec![
            ("", TurnOutcome::ToolCallsRequested(vec![call("a", "rust")])),
            ("final", TurnOutcome::FinalText("final".into())),
        ]);
        let mut messages = vec![Message::user("go")];
        let mut handler = echo_handler;

        let text = provider
            .generate_with_tools(&mut messages, &[search_tool()], opts(8), &mut handler)
            .await
            .unwrap();

        assert_eq!(text, "final");
        assert_eq!(messages[2].content, "results for rust");
    }
}
