//! Long-term memory the agent writes to after every turn.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

pub use crate::error::MemoryError;

/// An append-only store of free-text records.
///
/// The agent appends one record per completed turn. The reasoning chain
/// queries the store for records relevant to the recent conversation and
/// shows them to the model. How relevance is computed is up to the
/// implementation: a vector store would use embeddings, the default
/// [`InMemoryStore`] uses keyword overlap.
#[async_trait]
pub trait EpisodicMemory: Send + Sync {
    /// Appends a record.
    async fn add(&self, record: String) -> Result<(), MemoryError>;

    /// Returns at most `limit` records relevant to `query`, most relevant
    /// first.
    async fn relevant(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, MemoryError>;
}

/// An in-process [`EpisodicMemory`] ranking records by keyword overlap.
///
/// A record's score is the number of distinct query terms it contains, where
/// a term is a lowercase run of alphanumeric characters. Records sharing no
/// term with the query are never returned; ties go to the newer record.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<String>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record, oldest first.
    pub async fn records(&self) -> Vec<String> {
        self.records.read().await.clone()
    }

    /// Returns the number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EpisodicMemory for InMemoryStore {
    async fn add(&self, record: String) -> Result<(), MemoryError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn relevant(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, MemoryError> {
        let query_terms: HashSet<String> = terms(query).collect();
        if query_terms.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let records = self.records.read().await;
        let mut scored: Vec<(usize, usize)> = records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let found: HashSet<String> =
                    terms(record).filter(|t| query_terms.contains(t)).collect();
                (!found.is_empty()).then_some((found.len(), idx))
            })
            .collect();
        // Higher score first, then newer first.
        scored.sort_unstable_by(|a, b| b.cmp(a));
        scored.truncate(limit);

        trace!("memory lookup matched {} record(s)", scored.len());
        Ok(scored
            .into_iter()
            .map(|(_, idx)| records[idx].clone())
            .collect())
    }
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(records: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        for record in records {
            store.add((*record).to_owned()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_append_only_order() {
        let store = store_with(&["first", "second"]).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.records().await, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_relevant_ranking() {
        let store = store_with(&[
            "Command search returned: rust crates",
            "Command write returned: saved notes.txt",
            "Command search returned: rust async runtimes",
            "Unrelated weather report",
        ])
        .await;

        let hits = store.relevant("search RUST async", 10).await.unwrap();
        assert_eq!(
            hits,
            [
                "Command search returned: rust async runtimes",
                "Command search returned: rust crates",
            ]
        );

        let hits = store.relevant("command", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        // Equal scores prefer the newer record.
        assert_eq!(hits[0], "Command search returned: rust async runtimes");
    }

    #[tokio::test]
    async fn test_relevant_nothing_matches() {
        let store = store_with(&["alpha"]).await;
        assert!(store.relevant("beta", 4).await.unwrap().is_empty());
        assert!(store.relevant("  ", 4).await.unwrap().is_empty());
        assert!(store.relevant("alpha", 0).await.unwrap().is_empty());
    }
}
