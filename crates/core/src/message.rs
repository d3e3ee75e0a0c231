//! Message domain types.
//!
//! A conversation is a plain `Vec<Message>`: the tool loop appends assistant
//! and tool-result messages to it and never reorders or removes anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolCall;

/// Metadata key holding the backend name that produced `RAW_CONTENT_KEY`.
const RAW_PROVIDER_KEY: &str = "raw_provider";
/// Metadata key holding the backend's native content structure.
const RAW_CONTENT_KEY: &str = "raw_content";

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (or the pipeline acting as one)
    User,
    /// The model
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// If this is a tool result, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (raw provider content, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg.tool_name = Some(tool_name.into());
        msg
    }

    /// Attach the backend's native content so follow-up turns to the same
    /// backend can replay it verbatim.
    pub fn with_raw_content(mut self, provider: &str, raw: serde_json::Value) -> Self {
        self.metadata
            .insert(RAW_PROVIDER_KEY.into(), serde_json::Value::String(provider.into()));
        self.metadata.insert(RAW_CONTENT_KEY.into(), raw);
        self
    }

    /// Native content recorded by `provider`, if this message carries any.
    pub fn raw_content_for(&self, provider: &str) -> Option<&serde_json::Value> {
        match self.metadata.get(RAW_PROVIDER_KEY) {
            Some(serde_json::Value::String(p)) if p == provider => {
                self.metadata.get(RAW_CONTENT_KEY)
            }
            _ => None,
        }
    }
}
