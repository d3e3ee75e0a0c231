//! Stage 1: ask the model which candidates deserve a place in the digest.
//!
//! The model is asked for a JSON array of pool keys. Whatever comes back is
//! coerced into a valid selection: unknown and repeated keys are dropped, a
//! short list is padded in pool order, a long one is truncated. A reply with
//! no usable array falls back to the first `max` pool entries.

use std::collections::HashSet;

use newsroom_core::candidate::CandidatePool;
use newsroom_core::message::Message;
use newsroom_core::provider::{GenerateOptions, Provider};
use regex_lite::Regex;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Stage};
use crate::prompts;

/// Inclusive bounds on the selection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for SelectionBounds {
    fn default() -> Self {
        Self { min: 15, max: 20 }
    }
}

impl SelectionBounds {
    /// Bounds clamped to the pool size. A pool smaller than `min` yields all
    /// of its items.
    fn clamp_to(self, pool_len: usize) -> Self {
        Self {
            min: self.min.min(pool_len),
            max: self.max.min(pool_len),
        }
    }
}

/// Build the Stage 1 prompt.
pub fn build_prompt(template: &str, pool: &CandidatePool, bounds: SelectionBounds) -> String {
    let effective = bounds.clamp_to(pool.len());
    prompts::fill(
        template,
        &[
            ("candidates", prompts::render_candidates(pool).as_str()),
            ("min_count", effective.min.to_string().as_str()),
            ("max_count", effective.max.to_string().as_str()),
            ("total", pool.len().to_string().as_str()),
        ],
    )
}

const ARRAY_PATTERN: &str = r"\[[\s\S]*?\]";

/// Extract the first bracketed JSON array of strings from a model reply.
fn extract_keys(response: &str) -> Option<Vec<String>> {
    let found = Regex::new(ARRAY_PATTERN).ok()?.find(response)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(found.as_str()).ok()?;
    Some(
        values
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .collect(),
    )
}

/// Turn a model reply into a valid selection of pool keys.
pub fn parse_selection(response: &str, pool: &CandidatePool, bounds: SelectionBounds) -> Vec<String> {
    let effective = bounds.clamp_to(pool.len());

    let Some(proposed) = extract_keys(response) else {
        warn!(
            fallback = effective.max,
            "No parseable selection array in model response, using first items"
        );
        return pool.keys().take(effective.max).map(String::from).collect();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut selected: Vec<String> = Vec::new();
    let mut dropped = 0usize;

    for key in proposed {
        if pool.contains(&key) && seen.insert(key.clone()) {
            selected.push(key);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!(dropped, "Dropped unknown or duplicate keys from selection");
    }

    if selected.len() < effective.min {
        let needed = effective.min - selected.len();
        warn!(
            selected = selected.len(),
            min = effective.min,
            "Selection below minimum, padding from pool order"
        );
        let padding: Vec<String> = pool
            .keys()
            .filter(|k| !seen.contains(*k))
            .take(needed)
            .map(String::from)
            .collect();
        selected.extend(padding);
    }

    if selected.len() > effective.max {
        debug!(
            selected = selected.len(),
            max = effective.max,
            "Selection above maximum, truncating"
        );
        selected.truncate(effective.max);
    }

    selected
}

/// Run Stage 1 against `provider`.
pub async fn select(
    provider: &dyn Provider,
    pool: &CandidatePool,
    template: &str,
    bounds: SelectionBounds,
    options: GenerateOptions,
) -> Result<Vec<String>, PipelineError> {
    let prompt = build_prompt(template, pool, bounds);

    info!(
        stage = %Stage::Selection,
        provider = provider.name(),
        candidates = pool.len(),
        min = bounds.min,
        max = bounds.max,
        "Selecting candidates"
    );

    let response = provider
        .generate(vec![Message::user(prompt)], options)
        .await
        .map_err(|e| PipelineError::stage(Stage::Selection, provider.name(), e))?;

    let selected = parse_selection(&response, pool, bounds);
    info!(stage = %Stage::Selection, selected = selected.len(), "Selection complete");
    Ok(selected)
}
