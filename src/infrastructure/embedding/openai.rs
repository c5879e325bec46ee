use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::{EmbeddingModel, EmbeddingsBuilder};
use rig::providers::openai;
use tracing::debug;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::{openai_client, EmbeddingConfig};

/// Inputs per embeddings request; well under the provider's per-call limit.
const BATCH_SIZE: usize = 256;

/// Hosted OpenAI embeddings through the rig provider client.
pub struct OpenAiEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// Fails with a configuration error when `OPENAI_API_KEY` is absent.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        Ok(Self::with_client(openai_client()?, config))
    }

    pub fn with_client(client: openai::Client, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let model = self.client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text.to_string())
            .map_err(|e| DomainError::external(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(|(_doc, emb)| Embedding::from_f64(&emb.first().vec))
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.client.embedding_model(&self.model);
        let mut out = Vec::with_capacity(texts.len());

        // one request per slice keeps vectors aligned with their inputs
        for batch in texts.chunks(BATCH_SIZE) {
            let vectors = model
                .embed_texts(batch.iter().map(|t| t.to_string()))
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;
            debug!(requested = batch.len(), returned = vectors.len(), "embedded batch");
            out.extend(vectors.iter().map(|v| Embedding::from_f64(&v.vec)));
        }

        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
