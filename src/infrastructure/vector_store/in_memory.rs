use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

/// Brute-force cosine index held in process memory.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<(DocumentChunk, Embedding)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> DomainError {
        DomainError::internal(format!("vector store lock poisoned: {e}"))
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert_batch(
        &self,
        entries: Vec<(DocumentChunk, Embedding)>,
    ) -> Result<(), DomainError> {
        // last occurrence of an id within the batch wins
        let mut seen = HashSet::new();
        let mut incoming: Vec<_> = entries
            .into_iter()
            .rev()
            .filter(|(chunk, _)| seen.insert(chunk.id))
            .collect();
        incoming.reverse();

        let mut store = self.entries.write().map_err(Self::lock_error)?;
        store.retain(|(chunk, _)| !seen.contains(&chunk.id));
        store.extend(incoming);
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self.entries.read().map_err(Self::lock_error)?;

        let mut results: Vec<SearchResult> = store
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        // stable sort: equal scores keep insertion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.entries.read().map_err(Self::lock_error)?.len())
    }
}
