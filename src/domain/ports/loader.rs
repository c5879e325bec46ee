use crate::domain::{errors::DomainError, Document};
use async_trait::async_trait;

/// Fetches a source and returns it as a plain-text [`Document`].
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<Document, DomainError>;
}
