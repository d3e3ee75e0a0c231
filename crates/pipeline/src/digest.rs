//! The two-stage digest pipeline: select, then elaborate.

use std::sync::Arc;

use newsroom_config::AppConfig;
use newsroom_core::candidate::{CandidateBatch, CandidatePool};
use newsroom_core::message::Message;
use newsroom_core::provider::{GenerateOptions, Provider};
use tracing::{debug, info};

use crate::error::{PipelineError, Stage};
use crate::prompts;
use crate::selection::{self, SelectionBounds};

/// A finished digest in one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub text: String,
    pub language: String,
}

/// Everything the pipeline needs besides the provider.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub bounds: SelectionBounds,
    pub stage1_max_tokens: u32,
    pub stage2_max_tokens: u32,
    pub temperature: f32,
    pub selection_template: String,
    pub elaboration_template: String,
    pub attribution_footer: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            bounds: SelectionBounds::default(),
            stage1_max_tokens: 2000,
            stage2_max_tokens: 8000,
            temperature: 1.0,
            selection_template: prompts::DEFAULT_SELECTION_TEMPLATE.into(),
            elaboration_template: prompts::DEFAULT_ELABORATION_TEMPLATE.into(),
            attribution_footer: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let pipeline = &config.pipeline;
        let templates = &config.prompts;
        Self {
            bounds: SelectionBounds {
                min: pipeline.min_selected,
                max: pipeline.max_selected,
            },
            stage1_max_tokens: pipeline.stage1_max_tokens,
            stage2_max_tokens: pipeline.stage2_max_tokens,
            temperature: config.llm.temperature,
            selection_template: templates
                .selection_template
                .clone()
                .unwrap_or_else(|| prompts::DEFAULT_SELECTION_TEMPLATE.into()),
            elaboration_template: templates
                .elaboration_template
                .clone()
                .unwrap_or_else(|| prompts::DEFAULT_ELABORATION_TEMPLATE.into()),
            attribution_footer: pipeline
                .attribution_footer
                .clone()
                .filter(|f| !f.trim().is_empty()),
        }
    }
}

pub struct DigestPipeline {
    provider: Arc<dyn Provider>,
    settings: PipelineSettings,
}

impl DigestPipeline {
    pub fn new(provider: Arc<dyn Provider>, settings: PipelineSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Build a digest in `language` from one candidate batch.
    pub async fn run(&self, batch: CandidateBatch, language: &str) -> Result<Digest, PipelineError> {
        let pool = CandidatePool::from_batch(batch);
        if pool.is_empty() {
            return Err(PipelineError::EmptyCandidatePool);
        }

        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            language,
            candidates = pool.len(),
            "Generating digest"
        );

        let selected = selection::select(
            self.provider.as_ref(),
            &pool,
            &self.settings.selection_template,
            self.settings.bounds,
            GenerateOptions::default()
                .with_max_tokens(self.settings.stage1_max_tokens)
                .with_temperature(self.settings.temperature),
        )
        .await?;

        let prompt = self.elaboration_prompt(&pool, &selected, language);
        debug!(prompt_len = prompt.len(), "Built elaboration prompt");

        info!(stage = %Stage::Elaboration, items = selected.len(), "Elaborating digest");
        let text = self
            .provider
            .generate(
                vec![Message::user(prompt)],
                GenerateOptions::default()
                    .with_max_tokens(self.settings.stage2_max_tokens)
                    .with_temperature(self.settings.temperature),
            )
            .await
            .map_err(|e| PipelineError::stage(Stage::Elaboration, self.provider.name(), e))?;

        info!(stage = %Stage::Elaboration, chars = text.len(), "Digest complete");
        Ok(Digest {
            text: append_footer(text, self.settings.attribution_footer.as_deref()),
            language: language.to_string(),
        })
    }

    fn elaboration_prompt(&self, pool: &CandidatePool, selected: &[String], language: &str) -> String {
        let items = selected
            .iter()
            .filter_map(|key| pool.get(key))
            .map(|entry| &entry.item);
        let mut prompt = prompts::fill(
            &self.settings.elaboration_template,
            &[
                ("news_items", prompts::render_news_items(items).as_str()),
                ("count", selected.len().to_string().as_str()),
            ],
        );
        if let Some(directive) = prompts::language_directive(language) {
            prompt.push_str(&directive);
        }
        prompt
    }
}

pub(crate) fn append_footer(text: String, footer: Option<&str>) -> String {
    match footer {
        Some(footer) => format!("{}\n\n{}", text.trim_end(), footer),
        None => text,
    }
}
