use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::services::RagService;
use crate::domain::{ports::DocumentLoader, split_content, Document, DomainError};

/// Outcome of loading one source into the retrieval index.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document: Document,
    pub chunks: usize,
}

/// Loads a source, splits it into overlapping chunks and indexes them.
pub struct IngestService {
    loader: Arc<dyn DocumentLoader>,
    rag: Arc<RagService>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IngestService {
    pub fn new(loader: Arc<dyn DocumentLoader>, rag: Arc<RagService>) -> Self {
        Self {
            loader,
            rag,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    #[instrument(skip(self))]
    pub async fn ingest(&self, source: &str) -> Result<IngestReport, DomainError> {
        let document = self.loader.load(source).await?;

        let chunks = split_content(&document, self.chunk_size, self.chunk_overlap)?;
        if chunks.is_empty() {
            return Err(DomainError::validation(format!(
                "source {source} produced no text to index"
            )));
        }

        self.rag.index_chunks(&chunks).await?;

        info!(
            source = %document.source,
            title = document.title.as_deref().unwrap_or(""),
            chars = document.char_count(),
            chunks = chunks.len(),
            "source indexed"
        );

        Ok(IngestReport {
            document,
            chunks: chunks.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::rag::testing::KeywordEmbedding;
    use crate::infrastructure::InMemoryVectorStore;
    use async_trait::async_trait;

    struct StaticLoader(String);

    #[async_trait]
    impl DocumentLoader for StaticLoader {
        async fn load(&self, source: &str) -> Result<Document, DomainError> {
            Ok(Document::new(source, self.0.clone()).with_title(Some("Docs".to_string())))
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl DocumentLoader for FailingLoader {
        async fn load(&self, _source: &str) -> Result<Document, DomainError> {
            Err(DomainError::external("connection refused"))
        }
    }

    fn rag() -> Arc<RagService> {
        Arc::new(RagService::new(
            Arc::new(KeywordEmbedding::new(vec!["langsmith", "trace"])),
            Arc::new(InMemoryVectorStore::new()),
            4,
        ))
    }

    #[tokio::test]
    async fn test_ingest_indexes_all_chunks() {
        let paragraph = "LangSmith lets you trace and evaluate LLM applications. ".repeat(8);
        let content = vec![paragraph; 5].join("\n\n");
        let rag = rag();
        let service = IngestService::new(Arc::new(StaticLoader(content)), rag.clone())
            .with_chunking(500, 100);

        let report = service.ingest("https://docs.example.com/").await.unwrap();

        assert!(report.chunks > 1);
        assert_eq!(report.document.source, "https://docs.example.com/");
        assert_eq!(report.document.title.as_deref(), Some("Docs"));
        assert_eq!(rag.indexed_chunks().await.unwrap(), report.chunks);
    }

    #[tokio::test]
    async fn test_ingest_empty_page_is_rejected() {
        let service = IngestService::new(Arc::new(StaticLoader("   ".to_string())), rag());
        let err = service.ingest("https://docs.example.com/").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ingest_propagates_loader_errors() {
        let service = IngestService::new(Arc::new(FailingLoader), rag());
        let err = service.ingest("https://docs.example.com/").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
