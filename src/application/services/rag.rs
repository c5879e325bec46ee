use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

/// Embeds queries and chunks and runs similarity search over the vector index.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        self.check_dimension(&embedding)?;
        let results = self.vector_store.search(&embedding, top_k).await?;
        debug!(hits = results.len(), "retrieved chunks");
        Ok(results)
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "embedding model returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }

        let entries = chunks.iter().cloned().zip(embeddings).collect();
        self.vector_store.upsert_batch(entries).await
    }

    pub async fn indexed_chunks(&self) -> Result<usize, DomainError> {
        self.vector_store.len().await
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), DomainError> {
        let expected = self.embedding.dimension();
        if embedding.dimension() != expected {
            return Err(DomainError::internal(format!(
                "embedding has {} dimensions, expected {expected}",
                embedding.dimension()
            )));
        }
        Ok(())
    }
}
