//! Configuration loading, validation, and management for Newsroom.
//!
//! Loads configuration from `~/.newsroom/config.toml` (or the path in
//! `NEWSROOM_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "NEWSROOM_CONFIG";

/// The root configuration structure.
///
/// Maps directly to `~/.newsroom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM backend selection and credentials
    #[serde(default)]
    pub llm: LlmConfig,

    /// Two-stage pipeline bounds and budgets
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Prompt templates (unset fields use the built-in templates)
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Web search tool settings for topic mode
    #[serde(default)]
    pub search: SearchConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend name: claude, openai, deepseek, grok, gemini
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; falls back to `LLM_MODEL`, then the backend default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key; falls back to the backend's environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    "claude".into()
}
fn default_temperature() -> f32 {
    1.0
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lower bound of the Stage 1 selection size
    #[serde(default = "default_min_selected")]
    pub min_selected: usize,

    /// Upper bound of the Stage 1 selection size
    #[serde(default = "default_max_selected")]
    pub max_selected: usize,

    #[serde(default = "default_stage1_max_tokens")]
    pub stage1_max_tokens: u32,

    #[serde(default = "default_stage2_max_tokens")]
    pub stage2_max_tokens: u32,

    /// Attempts per digest, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// One digest is produced per language code
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Appended to every digest when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution_footer: Option<String>,
}

fn default_min_selected() -> usize {
    15
}
fn default_max_selected() -> usize {
    20
}
fn default_stage1_max_tokens() -> u32 {
    2000
}
fn default_stage2_max_tokens() -> u32 {
    8000
}
fn default_max_retries() -> u32 {
    3
}
fn default_languages() -> Vec<String> {
    vec!["en".into()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_selected: default_min_selected(),
            max_selected: default_max_selected(),
            stage1_max_tokens: default_stage1_max_tokens(),
            stage2_max_tokens: default_stage2_max_tokens(),
            max_retries: default_max_retries(),
            languages: default_languages(),
            attribution_footer: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Stage 1 template: `{candidates}`, `{min_count}`, `{max_count}`, `{total}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_template: Option<String>,

    /// Stage 2 template: `{news_items}`, `{count}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elaboration_template: Option<String>,

    /// Topic mode template: `{topics}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_template: Option<String>,

    /// Topics used by `newsroom topics` when none are given on the command line
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Searches allowed per digest before the tool answers with a stop notice
    #[serde(default = "default_max_searches")]
    pub max_searches: u32,

    /// Tool loop round-trip cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_search_max_tokens")]
    pub max_tokens: u32,

    /// Instant-answer endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_max_searches() -> u32 {
    6
}
fn default_max_iterations() -> u32 {
    8
}
fn default_search_max_tokens() -> u32 {
    8000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_searches: default_max_searches(),
            max_iterations: default_max_iterations(),
            max_tokens: default_search_max_tokens(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl AppConfig {
    /// Load configuration from the default location (or `NEWSROOM_CONFIG`),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None, |key| std::env::var(key).ok())
    }

    /// Load from `path` if given, else from `NEWSROOM_CONFIG`, else the
    /// default location, reading environment variables through `env`.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => env(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_path),
        };
        let mut config = Self::read_file(&config_path)?;

        // Environment variable overrides (highest priority)
        config.apply_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply `LLM_PROVIDER`, `LLM_MODEL`, `AI_RESPONSE_LANGUAGES` and
    /// `ENABLE_WEB_SEARCH`.
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = env("LLM_PROVIDER").filter(|v| !v.trim().is_empty()) {
            self.llm.provider = provider.trim().to_lowercase();
        }

        if let Some(model) = env("LLM_MODEL").filter(|v| !v.trim().is_empty()) {
            self.llm.model = Some(model.trim().to_string());
        }

        if let Some(languages) = env("AI_RESPONSE_LANGUAGES") {
            let parsed = parse_language_list(&languages);
            if !parsed.is_empty() {
                self.pipeline.languages = parsed;
            }
        }

        if let Some(flag) = env("ENABLE_WEB_SEARCH") {
            self.search.enabled = parse_bool(&flag);
        }
    }

    /// The default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".newsroom")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pipeline.min_selected == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.min_selected must be at least 1".into(),
            ));
        }

        if self.pipeline.min_selected > self.pipeline.max_selected {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.min_selected ({}) must not exceed pipeline.max_selected ({})",
                self.pipeline.min_selected, self.pipeline.max_selected
            )));
        }

        if self.pipeline.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_retries must be at least 1".into(),
            ));
        }

        if self.search.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_iterations must be at least 1".into(),
            ));
        }

        if self.pipeline.languages.is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.languages must name at least one language".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `newsroom config`).
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML, with the API key removed.
    pub fn to_toml(&self) -> String {
        let mut shown = self.clone();
        shown.llm.api_key = None;
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

/// Split a comma-separated language list, lowercasing and dropping blanks.
pub fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
