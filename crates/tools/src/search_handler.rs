//! Tool-loop handler that routes `web_search` calls to [`WebSearchTool`]
//! under a per-digest search budget.

use async_trait::async_trait;
use newsroom_core::error::ToolError;
use newsroom_core::tool::{Tool, ToolCall, ToolHandler};
use tracing::{info, warn};

use crate::web_search::{TOOL_NAME, WebSearchTool};

pub const DEFAULT_SEARCH_LIMIT: u32 = 6;

/// Returned instead of searching once the budget is spent.
pub const BUDGET_EXHAUSTED_MESSAGE: &str = "Maximum number of searches reached. Please create the digest based on the information gathered so far.";

/// Returned for any tool other than `web_search`.
pub const TOOL_NOT_AVAILABLE_MESSAGE: &str = "Tool not available";

/// How many searches a single digest may run.
///
/// Owned by the caller and lent to the handler, so the count survives the
/// tool loop and can be inspected afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub count: u32,
    pub limit: u32,
}

impl SearchBudget {
    pub fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    /// Record one search attempt. Returns false once the limit is exceeded.
    pub fn try_consume(&mut self) -> bool {
        self.count += 1;
        self.count <= self.limit
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_LIMIT)
    }
}

pub struct SearchToolHandler<'a> {
    tool: &'a WebSearchTool,
    budget: &'a mut SearchBudget,
}

impl<'a> SearchToolHandler<'a> {
    pub fn new(tool: &'a WebSearchTool, budget: &'a mut SearchBudget) -> Self {
        Self { tool, budget }
    }
}

#[async_trait]
impl ToolHandler for SearchToolHandler<'_> {
    async fn handle(&mut self, call: &ToolCall) -> Result<String, ToolError> {
        if call.name != TOOL_NAME {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return Ok(TOOL_NOT_AVAILABLE_MESSAGE.into());
        }

        if !self.budget.try_consume() {
            info!(
                count = self.budget.count,
                limit = self.budget.limit,
                "Search budget exhausted"
            );
            return Ok(BUDGET_EXHAUSTED_MESSAGE.into());
        }

        self.tool.execute(&call.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "web_search".into(),
            arguments: serde_json::json!({"query": "ai agents"}),
        }
    }

    #[test]
    fn budget_allows_exactly_limit() {
        let mut budget = SearchBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.count, 3);
    }

    #[test]
    fn default_budget_is_six() {
        assert_eq!(SearchBudget::default().limit, 6);
    }

    #[tokio::test]
    async fn stops_searching_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Heading": "Agents",
                "Abstract": "Software that acts.",
                "AbstractURL": "https://example.com/agents",
                "RelatedTopics": []
            })))
            .expect(2)
            .mount(&server)
            .await;

        let tool = WebSearchTool::new().unwrap().with_base_url(server.uri());
        let mut budget = SearchBudget::new(2);
        {
            let mut handler = SearchToolHandler::new(&tool, &mut budget);
            for id in ["a", "b"] {
                let out = handler.handle(&search_call(id)).await.unwrap();
                assert!(out.contains("Agents"));
            }
            let out = handler.handle(&search_call("c")).await.unwrap();
            assert_eq!(out, BUDGET_EXHAUSTED_MESSAGE);
        }
        assert_eq!(budget.count, 3);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_available() {
        let tool = WebSearchTool::new().unwrap();
        let mut budget = SearchBudget::default();
        let mut handler = SearchToolHandler::new(&tool, &mut budget);
        let call = ToolCall {
            id: "x".into(),
            name: "shell".into(),
            arguments: serde_json::json!({}),
        };
        assert_eq!(handler.handle(&call).await.unwrap(), "Tool not available");
        drop(handler);
        assert_eq!(budget.count, 0);
    }
}
