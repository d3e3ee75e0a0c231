//! `newsroom topics`: Single-shot digest from a topic list.

use std::path::PathBuf;

use newsroom_config::AppConfig;
use newsroom_pipeline::prompts::DEFAULT_TOPICS;
use newsroom_pipeline::{RetryPolicy, TopicGenerator, with_retry};
use tracing::error;

use crate::output;

/// Topics from the command line, else from configuration, else built-ins.
pub(crate) fn resolve_topics(config: &AppConfig, from_cli: Vec<String>) -> Vec<String> {
    if !from_cli.is_empty() {
        return from_cli;
    }
    if !config.prompts.topics.is_empty() {
        return config.prompts.topics.clone();
    }
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

pub async fn run(
    config: &AppConfig,
    topics: Vec<String>,
    web_search: bool,
    languages: Vec<String>,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if web_search {
        config.search.enabled = true;
    }

    let provider = newsroom_providers::build_from_config(&config)?;
    let generator = TopicGenerator::from_config(provider, &config)?;
    let topics = resolve_topics(&config, topics);
    let policy = RetryPolicy::new(config.pipeline.max_retries);
    let languages = super::resolve_languages(&config, &languages);

    let generator = &generator;
    let topic_list = topics.as_slice();
    let mut failed = Vec::new();
    for language in &languages {
        let language = language.as_str();
        match with_retry(policy, "topics", move |_| generator.generate(topic_list, language)).await {
            Ok(digest) => {
                output::emit(&digest, "topics", output_dir.as_deref())?;
            }
            Err(e) if !e.is_retryable() => return Err(e.into()),
            Err(e) => {
                error!(language, error = %e, "Topic digest generation failed");
                failed.push(language.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(format!(
            "Topic digest failed for {} of {} languages: {}",
            failed.len(),
            languages.len(),
            failed.join(", ")
        )
        .into());
    }
    Ok(())
}
