//! Error types for digest generation.

use std::fmt;
use std::path::PathBuf;

use newsroom_core::error::ProviderError;
use thiserror::Error;

/// Which model-facing step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stage 1: pick a subset of candidates
    Selection,
    /// Stage 2: write the digest from the selection
    Elaboration,
    /// Single-shot digest from a topic list
    TopicGeneration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection => write!(f, "selection"),
            Self::Elaboration => write!(f, "elaboration"),
            Self::TopicGeneration => write!(f, "topic generation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No candidate items available to build a digest from")]
    EmptyCandidatePool,

    #[error("{stage} stage failed on provider '{provider}': {source}")]
    Stage {
        stage: Stage,
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to fetch candidates: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub(crate) fn stage(stage: Stage, provider: &str, source: ProviderError) -> Self {
        Self::Stage {
            stage,
            provider: provider.to_string(),
            source,
        }
    }

    /// Whether another attempt could succeed. Configuration problems cannot.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Stage { source, .. } => !source.is_configuration(),
            Self::EmptyCandidatePool | Self::Fetch(_) => true,
        }
    }
}

/// Errors from a [`CandidateSource`](crate::source::CandidateSource).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to read candidates from {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse candidates from {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Candidate source unavailable: {0}")]
    Unavailable(String),
}
