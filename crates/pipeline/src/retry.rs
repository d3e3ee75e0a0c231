//! Whole-invocation retries.
//!
//! A failed digest is retried from the top, candidate fetch included, with no
//! backoff. Configuration errors end the loop immediately.

use std::future::Future;

use tracing::{error, info, warn};

use crate::digest::{Digest, DigestPipeline};
use crate::error::PipelineError;
use crate::source::CandidateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

/// Run `op` until it succeeds or the policy is spent.
///
/// `op` receives the 1-based attempt number. The error of the last attempt is
/// returned unchanged.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, PipelineError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(task = label, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(task = label, attempt, max_attempts, error = %e, "Attempt failed");

                if !e.is_retryable() {
                    error!(task = label, attempt, error = %e, "Not retrying configuration error");
                    return Err(e);
                }
                if attempt >= max_attempts {
                    error!(task = label, attempts = attempt, error = %e, "All attempts failed");
                    return Err(e);
                }
                attempt += 1;
            }
        }
    }
}

/// Fetch candidates and run the pipeline, retrying both together.
pub async fn generate_with_retry(
    pipeline: &DigestPipeline,
    source: &dyn CandidateSource,
    language: &str,
    policy: RetryPolicy,
) -> Result<Digest, PipelineError> {
    with_retry(policy, "digest", |attempt| async move {
        info!(attempt, source = source.name(), language, "Fetching candidates");
        let batch = source.fetch(language).await?;
        pipeline.run(batch, language).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use newsroom_core::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(RetryPolicy::default(), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(PipelineError::EmptyCandidatePool)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_with_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(RetryPolicy::new(3), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(PipelineError::stage(
                    Stage::Elaboration,
                    "claude",
                    ProviderError::Network(format!("attempt {attempt}")),
                ))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("attempt 3"));
    }

    #[tokio::test]
    async fn configuration_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(RetryPolicy::new(5), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PipelineError::Configuration("bad".into())) }
        })
        .await;

        assert!(matches!(result, Err(PipelineError::Configuration(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = with_retry(RetryPolicy::new(0), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(PipelineError::EmptyCandidatePool) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
