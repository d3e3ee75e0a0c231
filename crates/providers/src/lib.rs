//! LLM Provider implementations for Newsroom.
//!
//! All providers implement the `newsroom_core::Provider` trait.
//! The registry selects the correct provider based on configuration.

pub mod anthropic;
pub mod gemini;
mod http;
pub mod openai_compat;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::{
    ProviderKind, ProviderSettings, available_providers, build_from_config, get_provider,
    get_provider_with,
};
