//! # Newsroom Core
//!
//! Domain types, traits, and error definitions for the Newsroom digest
//! generator. This crate has **no HTTP dependencies**: it defines the
//! provider contract, the tool-calling loop, and the candidate model that the
//! provider, tool, and pipeline crates implement against.
//!
//! ## Design Philosophy
//!
//! Every backend-facing seam is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping LLM backends via configuration
//! - Easy testing with scripted providers
//! - Clean dependency graph (all crates depend inward on core)

pub mod candidate;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod tool_loop;

// Re-export key types at crate root for ergonomics
pub use candidate::{CandidateBatch, CandidateItem, CandidatePool, PoolEntry, PoolKind};
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, Role};
pub use provider::{
    GenerateOptions, Provider, ProviderRequest, ProviderResponse, ToolLoopOptions, TurnOutcome,
    Usage,
};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolHandler};
