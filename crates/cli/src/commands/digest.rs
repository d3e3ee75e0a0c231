//! `newsroom digest`: Two-stage digest from a candidate file.

use std::path::PathBuf;

use newsroom_config::AppConfig;
use newsroom_pipeline::{
    DigestPipeline, JsonFileSource, PipelineSettings, RetryPolicy, generate_with_retry,
};
use tracing::error;

use crate::output;

pub async fn run(
    config: &AppConfig,
    candidates: PathBuf,
    languages: Vec<String>,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = newsroom_providers::build_from_config(config)?;
    let pipeline = DigestPipeline::new(provider, PipelineSettings::from_config(config));
    let source = JsonFileSource::new(candidates);
    let policy = RetryPolicy::new(config.pipeline.max_retries);
    let languages = super::resolve_languages(config, &languages);

    let mut failed = Vec::new();
    for language in &languages {
        match generate_with_retry(&pipeline, &source, language, policy).await {
            Ok(digest) => {
                output::emit(&digest, "digest", output_dir.as_deref())?;
            }
            Err(e) if !e.is_retryable() => return Err(e.into()),
            Err(e) => {
                error!(language = %language, error = %e, "Digest generation failed");
                failed.push(language.clone());
            }
        }
    }

    if !failed.is_empty() {
        return Err(format!(
            "Digest failed for {} of {} languages: {}",
            failed.len(),
            languages.len(),
            failed.join(", ")
        )
        .into());
    }
    Ok(())
}
