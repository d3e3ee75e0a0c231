//! Tool types: what the model may call and how calls are answered.
//!
//! A [`ToolDefinition`] is provider-agnostic; each adapter renders it into its
//! own wire shape. A [`ToolHandler`] answers [`ToolCall`]s during the tool
//! loop, one at a time and in the order the backend emitted them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id (the backend's call id, or a generated one)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value (normally an object)
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// String argument lookup.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Unsigned integer argument lookup.
    pub fn u64_arg(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(|v| v.as_u64())
    }
}

/// A capability that can be offered to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "web_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool and render its output as text for the model.
    async fn execute(&self, arguments: &serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Answers tool calls on behalf of the tool loop.
///
/// Handlers take `&mut self` so they can keep per-invocation state such as a
/// search budget.
#[async_trait]
pub trait ToolHandler: Send {
    async fn handle(&mut self, call: &ToolCall) -> Result<String, ToolError>;
}

#[async_trait]
impl<F> ToolHandler for F
where
    F: FnMut(&ToolCall) -> Result<String, ToolError> + Send,
{
    async fn handle(&mut self, call: &ToolCall) -> Result<String, ToolError> {
        self(call)
    }
}
