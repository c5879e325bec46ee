pub mod agent;
pub mod config;
pub mod embedding;
pub mod loader;
pub mod tools;
pub mod vector_store;

pub use agent::ResearchAgent;
pub use config::{require_api_key, AppConfig, Config, PromptsConfig};
pub use embedding::OpenAiEmbedding;
pub use loader::WebPageLoader;
pub use tools::{ArxivTool, RetrieverTool, WikipediaTool};
pub use vector_store::InMemoryVectorStore;
