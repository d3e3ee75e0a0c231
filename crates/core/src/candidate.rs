//! Candidate content items and the keyed pool built from them.
//!
//! The fetch side delivers a [`CandidateBatch`] split into a primary and a
//! regional list. The pipeline flattens it into a [`CandidatePool`] whose keys
//! (`P-1..`, `R-1..`) are what the selection stage asks the model to return.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One content item as delivered by a feed fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Items from one fetch, grouped by origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateBatch {
    #[serde(default)]
    pub primary: Vec<CandidateItem>,
    #[serde(default)]
    pub regional: Vec<CandidateItem>,
}

impl CandidateBatch {
    pub fn len(&self) -> usize {
        self.primary.len() + self.regional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.regional.is_empty()
    }
}

/// Which list a pool entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Primary,
    Regional,
}

impl PoolKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Primary => "P",
            Self::Regional => "R",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Regional => write!(f, "regional"),
        }
    }
}

/// A candidate item together with its pool key.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub key: String,
    pub kind: PoolKind,
    pub item: CandidateItem,
}

/// Flattened, keyed view of a [`CandidateBatch`].
///
/// Entries are ordered primary first, then regional, each in fetch order.
/// This order is also the fallback order used when the model's selection is
/// unusable or too short.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entries: Vec<PoolEntry>,
}

impl CandidatePool {
    pub fn from_batch(batch: CandidateBatch) -> Self {
        let primary = batch
            .primary
            .into_iter()
            .enumerate()
            .map(|(i, item)| PoolEntry::new(PoolKind::Primary, i + 1, item));
        let regional = batch
            .regional
            .into_iter()
            .enumerate()
            .map(|(i, item)| PoolEntry::new(PoolKind::Regional, i + 1, item));

        Self {
            entries: primary.chain(regional).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys in pool order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&PoolEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Entries from one list, in fetch order.
    pub fn entries_of(&self, kind: PoolKind) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

impl PoolEntry {
    fn new(kind: PoolKind, ordinal: usize, item: CandidateItem) -> Self {
        Self {
            key: format!("{}-{}", kind.prefix(), ordinal),
            kind,
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> CandidateItem {
        CandidateItem {
            id: title.to_lowercase(),
            title: title.into(),
            source: "Feed".into(),
            description: String::new(),
            link: format!("https://example.com/{}", title.to_lowercase()),
            published_at: None,
        }
    }

    #[test]
    fn pool_keys_primary_then_regional() {
        let batch = CandidateBatch {
            primary: vec![item("A"), item("B")],
            regional: vec![item("C")],
        };
        let pool = CandidatePool::from_batch(batch);

        let keys: Vec<&str> = pool.keys().collect();
        assert_eq!(keys, vec!["P-1", "P-2", "R-1"]);
        assert_eq!(pool.get("R-1").unwrap().item.title, "C");
        assert_eq!(pool.get("R-1").unwrap().kind, PoolKind::Regional);
        assert!(!pool.contains("P-3"));
        assert_eq!(pool.entries_of(PoolKind::Primary).count(), 2);
    }

    #[test]
    fn empty_batch_gives_empty_pool() {
        let pool = CandidatePool::from_batch(CandidateBatch::default());
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn batch_deserializes_with_missing_fields() {
        let json = r#"{
            "primary": [{"title": "Model release", "link": "https://a.test/1"}]
        }"#;
        let batch: CandidateBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.regional.is_empty());
        assert_eq!(batch.primary[0].source, "");
        assert!(batch.primary[0].published_at.is_none());
    }
}
