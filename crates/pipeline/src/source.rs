//! Where candidate items come from.
//!
//! Feed collection lives outside this crate; a [`CandidateSource`] is the
//! seam it plugs into. Two sources ship here: a fixed in-memory batch and a
//! JSON file written by an external collector.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use newsroom_core::candidate::{CandidateBatch, CandidateItem};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::FetchError;

/// Produces the candidate batch for one digest run.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fetch candidates for a digest in `language`.
    async fn fetch(&self, language: &str) -> Result<CandidateBatch, FetchError>;
}

/// Always returns the same batch.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    batch: CandidateBatch,
}

impl StaticSource {
    pub fn new(batch: CandidateBatch) -> Self {
        Self { batch }
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, _language: &str) -> Result<CandidateBatch, FetchError> {
        Ok(self.batch.clone())
    }
}

/// Reads candidates from a JSON file.
///
/// Accepts either `{"primary": [...], "regional": [...]}` or a bare array,
/// which is treated as primary items only.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateFile {
    Batch(CandidateBatch),
    Items(Vec<CandidateItem>),
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<CandidateBatch, FetchError> {
        let file: CandidateFile =
            serde_json::from_str(content).map_err(|e| FetchError::Parse {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(match file {
            CandidateFile::Batch(batch) => batch,
            CandidateFile::Items(primary) => CandidateBatch {
                primary,
                regional: Vec::new(),
            },
        })
    }
}

#[async_trait]
impl CandidateSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch(&self, language: &str) -> Result<CandidateBatch, FetchError> {
        debug!(path = %self.path.display(), language, "Reading candidates");
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Read {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let batch = self.parse(&content)?;
        info!(
            primary = batch.primary.len(),
            regional = batch.regional.len(),
            "Loaded candidates"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_grouped_batch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"primary": [{{"title": "A", "link": "https://a.test"}}], "regional": [{{"title": "B"}}]}}"#
        )
        .unwrap();

        let batch = JsonFileSource::new(file.path()).fetch("en").await.unwrap();
        assert_eq!(batch.primary.len(), 1);
        assert_eq!(batch.regional.len(), 1);
        assert_eq!(batch.primary[0].link, "https://a.test");
        assert_eq!(batch.regional[0].title, "B");
    }

    #[tokio::test]
    async fn bare_array_is_primary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title": "A"}}, {{"title": "B", "source": "Wire"}}]"#).unwrap();

        let batch = JsonFileSource::new(file.path()).fetch("en").await.unwrap();
        assert_eq!(batch.primary.len(), 2);
        assert!(batch.regional.is_empty());
        assert_eq!(batch.primary[1].source, "Wire");
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileSource::new(dir.path().join("nope.json"))
            .fetch("en")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonFileSource::new(file.path()).fetch("en").await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn static_source_clones_batch() {
        let source = StaticSource::new(CandidateBatch::default());
        assert!(source.fetch("zh").await.unwrap().is_empty());
        assert_eq!(source.name(), "static");
    }
}
