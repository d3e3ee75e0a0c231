//! Web search tool backed by the DuckDuckGo instant-answer API.
//!
//! The instant-answer endpoint needs no key. It returns an optional abstract
//! plus a list of related topics; both are folded into a flat result list,
//! abstract first.

use std::time::Duration;

use async_trait::async_trait;
use newsroom_core::error::ToolError;
use newsroom_core::tool::Tool;
use serde::Deserialize;
use tracing::{error, info};

pub const TOOL_NAME: &str = "web_search";
pub const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com";
pub const DEFAULT_MAX_RESULTS: usize = 10;
const DEFAULT_QUERY: &str = "AI news";
const SEARCH_TIMEOUT_SECS: u64 = 10;

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

pub struct WebSearchTool {
    base_url: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            client,
        })
    }

    /// Point the tool at another instant-answer endpoint (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run a search. Transport and decode failures are logged and yield no
    /// results, so the model can carry on with what it already has.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        info!(query, "Searching");
        match self.fetch(query).await {
            Ok(answer) => {
                let results = collect_results(answer, query, max_results);
                info!(count = results.len(), "Found search results");
                results
            }
            Err(e) => {
                error!(query, error = %e, "Search failed");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<InstantAnswer, reqwest::Error> {
        self.client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("t", "newsroom"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Flatten an instant answer into results: abstract first, then related
/// topics that carry text, truncated to `max_results`.
fn collect_results(answer: InstantAnswer, query: &str, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        results.push(SearchResult {
            title: if answer.heading.is_empty() {
                query.to_string()
            } else {
                answer.heading
            },
            snippet: answer.abstract_text,
            url: answer.abstract_url,
        });
    }

    for topic in answer.related_topics {
        if topic.text.is_empty() {
            continue;
        }
        let title = topic
            .first_url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .replace('_', " ");
        results.push(SearchResult {
            title,
            snippet: topic.text,
            url: topic.first_url,
        });
    }

    results.truncate(max_results);
    results
}

/// Render results as numbered text for the model.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!(
            "No results found for '{query}'. Try a different query or proceed with the information you have."
        );
    }

    let mut text = format!("Search results for '{query}':\n\n");
    for (i, result) in results.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, result.title));
        text.push_str(&format!("   {}\n", result.snippet));
        if !result.url.is_empty() {
            text.push_str(&format!("   URL: {}\n", result.url));
        }
        text.push('\n');
    }
    text
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the web for current AI news and information. Use this tool to find the most recent AI-related news, breakthroughs, product launches, and developments. This is essential for getting up-to-date information beyond the model's training data."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant AI news. Examples: 'AI news this week', 'OpenAI GPT updates', 'machine learning breakthroughs'"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of search results to return (default: 10)",
                    "default": DEFAULT_MAX_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(DEFAULT_QUERY);
        let max_results = arguments["max_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let results = self.search(query, max_results).await;
        Ok(format_results(query, &results))
    }
}

// --- Instant-answer API types ---

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "Abstract", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

/// Grouped topics (`{"Name": .., "Topics": [..]}`) deserialize with empty
/// text and are skipped.
#[derive(Debug, Default, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
}
