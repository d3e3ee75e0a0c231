//! Provider registry: maps a configured backend name to a constructed
//! provider.
//!
//! Credentials resolve as explicit argument, then the backend's environment
//! variable. Models resolve as explicit argument, then `LLM_MODEL`, then the
//! backend default. Construction never touches the network.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use newsroom_config::AppConfig;
use newsroom_core::error::ProviderError;
use newsroom_core::provider::Provider;
use tracing::info;

use crate::anthropic::{self, AnthropicProvider};
use crate::gemini::{self, GeminiProvider};
use crate::openai_compat::{self, OpenAiCompatProvider};

/// Environment variable consulted when no model is given explicitly.
pub const MODEL_ENV: &str = "LLM_MODEL";

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
    DeepSeek,
    Grok,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Claude,
        ProviderKind::OpenAi,
        ProviderKind::DeepSeek,
        ProviderKind::Grok,
        ProviderKind::Gemini,
    ];

    /// Configuration name of this backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Grok => "grok",
            Self::Gemini => "gemini",
        }
    }

    /// Environment variable holding this backend's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Grok => "XAI_API_KEY",
            Self::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Claude => anthropic::DEFAULT_MODEL,
            Self::OpenAi => "gpt-4o",
            Self::DeepSeek => "deepseek-reasoner",
            Self::Grok => "grok-beta",
            Self::Gemini => gemini::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Claude => anthropic::DEFAULT_BASE_URL,
            Self::OpenAi => openai_compat::OPENAI_BASE_URL,
            Self::DeepSeek => openai_compat::DEEPSEEK_BASE_URL,
            Self::Grok => openai_compat::GROK_BASE_URL,
            Self::Gemini => gemini::DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: s.to_string(),
                available: available_providers().join(", "),
            })
    }
}

/// Names of every supported backend.
pub fn available_providers() -> Vec<&'static str> {
    ProviderKind::ALL.iter().map(|k| k.as_str()).collect()
}

/// What to build. Unset fields fall back to the environment and defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Build a provider by name, reading fallbacks from the process environment.
pub fn get_provider(
    name: &str,
    settings: ProviderSettings,
) -> Result<Arc<dyn Provider>, ProviderError> {
    get_provider_with(name, settings, |key| std::env::var(key).ok())
}

/// Build a provider by name, reading fallbacks through `env`.
pub fn get_provider_with<F>(
    name: &str,
    settings: ProviderSettings,
    env: F,
) -> Result<Arc<dyn Provider>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind: ProviderKind = name.parse()?;

    let api_key = non_blank(settings.api_key)
        .or_else(|| non_blank(env(kind.api_key_env())))
        .ok_or_else(|| ProviderError::MissingCredential {
            provider: kind.to_string(),
            env_var: kind.api_key_env().to_string(),
        })?;

    let model = non_blank(settings.model).or_else(|| non_blank(env(MODEL_ENV)));
    let base_url = non_blank(settings.base_url);

    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Claude => {
            let mut p = AnthropicProvider::new(api_key, model)?;
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi | ProviderKind::DeepSeek | ProviderKind::Grok => {
            let p = OpenAiCompatProvider::new(
                kind.as_str(),
                base_url.as_deref().unwrap_or(kind.default_base_url()),
                api_key,
                kind.default_model(),
                model,
            )?;
            Arc::new(p)
        }
        ProviderKind::Gemini => {
            let mut p = GeminiProvider::new(api_key, model)?;
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
    };

    info!(provider = %kind, model = provider.model(), "LLM provider initialized");
    Ok(provider)
}

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    get_provider(
        &config.llm.provider,
        ProviderSettings {
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            base_url: config.llm.base_url.clone(),
        },
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_kind_case_insensitive() {
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!(" grok ".parse::<ProviderKind>().unwrap(), ProviderKind::Grok);
    }

    #[test]
    fn unknown_provider_lists_available() {
        let err = "mistral".parse::<ProviderKind>().unwrap_err();
        match &err {
            ProviderError::UnknownProvider { name, available } => {
                assert_eq!(name, "mistral");
                assert_eq!(available, "claude, openai, deepseek, grok, gemini");
            }
            other => panic!("Expected UnknownProvider, got {other:?}"),
        }
        assert!(err.is_configuration());
    }

    #[test]
    fn explicit_key_wins_over_env() {
        let env = env_from(&[("ANTHROPIC_API_KEY", "from-env")]);
        let provider = get_provider_with(
            "claude",
            ProviderSettings {
                api_key: Some("explicit".into()),
                ..Default::default()
            },
            env,
        )
        .unwrap();
        assert_eq!(provider.name(), "claude");
        assert_eq!(provider.model(), "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn key_from_env_var() {
        let env = env_from(&[("XAI_API_KEY", "xai-key")]);
        let provider = get_provider_with("grok", ProviderSettings::default(), env).unwrap();
        assert_eq!(provider.name(), "grok");
        assert_eq!(provider.model(), "grok-beta");
    }

    #[test]
    fn missing_key_is_configuration_error() {
        let env = env_from(&[("OPENAI_API_KEY", "   ")]);
        let err = get_provider_with("deepseek", ProviderSettings::default(), env).err().expect("expected error");
        match &err {
            ProviderError::MissingCredential { provider, env_var } => {
                assert_eq!(provider, "deepseek");
                assert_eq!(env_var, "DEEPSEEK_API_KEY");
            }
            other => panic!("Expected MissingCredential, got {other:?}"),
        }
        assert!(err.is_configuration());
    }

    #[test]
    fn model_resolution_order() {
        let env = env_from(&[("GOOGLE_API_KEY", "g"), ("LLM_MODEL", "gemini-1.5-pro")]);
        let from_env = get_provider_with("gemini", ProviderSettings::default(), &env).unwrap();
        assert_eq!(from_env.model(), "gemini-1.5-pro");

        let explicit = get_provider_with(
            "gemini",
            ProviderSettings {
                model: Some("gemini-2.5-flash".into()),
                ..Default::default()
            },
            &env,
        )
        .unwrap();
        assert_eq!(explicit.model(), "gemini-2.5-flash");
        assert_eq!(explicit.default_model(), "gemini-2.0-flash-exp");
    }

    #[test]
    fn every_kind_builds_without_network() {
        for kind in ProviderKind::ALL {
            let env = env_from(&[(kind.api_key_env(), "test-key")]);
            let provider = get_provider_with(kind.as_str(), ProviderSettings::default(), env)
                .unwrap();
            assert_eq!(provider.name(), kind.as_str());
            assert_eq!(provider.default_model(), kind.default_model());
        }
    }

    #[test]
    fn build_from_config_uses_config_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "openai".into();
        config.llm.api_key = Some("sk-config".into());
        config.llm.model = Some("gpt-4o-mini".into());

        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }
}
