//! Single-shot digests from a topic list, optionally researched with web
//! search through the tool loop.

use std::sync::Arc;

use newsroom_config::AppConfig;
use newsroom_core::message::Message;
use newsroom_core::provider::{GenerateOptions, Provider, ToolLoopOptions};
use newsroom_core::tool::Tool;
use newsroom_tools::{SearchBudget, SearchToolHandler, WebSearchTool};
use tracing::info;

use crate::digest::{Digest, append_footer};
use crate::error::{PipelineError, Stage};
use crate::prompts;

#[derive(Debug, Clone)]
pub struct TopicSettings {
    pub template: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Searches allowed per digest
    pub max_searches: u32,
    /// Tool loop round-trip cap
    pub max_iterations: u32,
    pub attribution_footer: Option<String>,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            template: prompts::DEFAULT_TOPIC_TEMPLATE.into(),
            temperature: 1.0,
            max_tokens: 8000,
            max_searches: 6,
            max_iterations: 8,
            attribution_footer: None,
        }
    }
}

impl TopicSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            template: config
                .prompts
                .topic_template
                .clone()
                .unwrap_or_else(|| prompts::DEFAULT_TOPIC_TEMPLATE.into()),
            temperature: config.llm.temperature,
            max_tokens: config.search.max_tokens,
            max_searches: config.search.max_searches,
            max_iterations: config.search.max_iterations,
            attribution_footer: config
                .pipeline
                .attribution_footer
                .clone()
                .filter(|f| !f.trim().is_empty()),
        }
    }
}

pub struct TopicGenerator {
    provider: Arc<dyn Provider>,
    settings: TopicSettings,
    search: Option<WebSearchTool>,
}

impl TopicGenerator {
    pub fn new(provider: Arc<dyn Provider>, settings: TopicSettings) -> Self {
        Self {
            provider,
            settings,
            search: None,
        }
    }

    /// Offer the model a `web_search` tool.
    pub fn with_search_tool(mut self, tool: WebSearchTool) -> Self {
        self.search = Some(tool);
        self
    }

    /// Build from configuration; the search tool is attached when
    /// `search.enabled` is set.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Result<Self, PipelineError> {
        let generator = Self::new(provider, TopicSettings::from_config(config));
        if !config.search.enabled {
            return Ok(generator);
        }

        let mut tool =
            WebSearchTool::new().map_err(|e| PipelineError::Configuration(e.to_string()))?;
        if let Some(base_url) = &config.search.base_url {
            tool = tool.with_base_url(base_url.clone());
        }
        Ok(generator.with_search_tool(tool))
    }

    pub fn uses_web_search(&self) -> bool {
        self.search.is_some()
    }

    pub fn build_prompt<S: AsRef<str>>(&self, topics: &[S], language: &str) -> String {
        let mut prompt = prompts::fill(
            &self.settings.template,
            &[("topics", prompts::render_topics(topics).as_str())],
        );
        if self.search.is_some() {
            prompt.push_str(prompts::WEB_SEARCH_INSTRUCTION);
        }
        if let Some(directive) = prompts::language_directive(language) {
            prompt.push_str(&directive);
        }
        prompt
    }

    pub async fn generate<S: AsRef<str>>(
        &self,
        topics: &[S],
        language: &str,
    ) -> Result<Digest, PipelineError> {
        let prompt = self.build_prompt(topics, language);
        let provider = self.provider.as_ref();

        info!(
            stage = %Stage::TopicGeneration,
            provider = provider.name(),
            model = provider.model(),
            topics = topics.len(),
            web_search = self.search.is_some(),
            language,
            "Generating topic digest"
        );

        let text = match &self.search {
            None => provider
                .generate(
                    vec![Message::user(prompt)],
                    GenerateOptions::default()
                        .with_max_tokens(self.settings.max_tokens)
                        .with_temperature(self.settings.temperature),
                )
                .await,
            Some(tool) => {
                let mut messages = vec![Message::user(prompt)];
                let mut budget = SearchBudget::new(self.settings.max_searches);
                let options = ToolLoopOptions {
                    max_tokens: self.settings.max_tokens,
                    temperature: self.settings.temperature,
                    max_iterations: self.settings.max_iterations,
                };
                let result = {
                    let mut handler = SearchToolHandler::new(tool, &mut budget);
                    provider
                        .generate_with_tools(&mut messages, &[tool.to_definition()], options, &mut handler)
                        .await
                };
                info!(
                    searches = budget.count.min(budget.limit),
                    turns = messages.len(),
                    "Tool loop finished"
                );
                result
            }
        }
        .map_err(|e| PipelineError::stage(Stage::TopicGeneration, provider.name(), e))?;

        Ok(Digest {
            text: append_footer(text, self.settings.attribution_footer.as_deref()),
            language: language.to_string(),
        })
    }
}
