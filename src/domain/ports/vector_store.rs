use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces entries by chunk id.
    async fn upsert_batch(
        &self,
        entries: Vec<(DocumentChunk, Embedding)>,
    ) -> Result<(), DomainError>;
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn len(&self) -> Result<usize, DomainError>;
}
