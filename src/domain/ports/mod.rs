mod embedding;
mod loader;
mod vector_store;

pub use embedding::EmbeddingService;
pub use loader::DocumentLoader;
pub use vector_store::VectorStore;
