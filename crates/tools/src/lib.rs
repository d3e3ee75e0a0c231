//! Built-in tool implementations for Newsroom.
//!
//! The only tool the digest generator offers a model is web search, used by
//! topic mode to gather current news before writing.

pub mod search_handler;
pub mod web_search;

pub use search_handler::{SearchBudget, SearchToolHandler};
pub use web_search::{SearchResult, WebSearchTool};
