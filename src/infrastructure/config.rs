use rig::providers::openai;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::DomainError;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Runtime settings plus the prompts handed to the agent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub source: SourceConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
    pub max_turns: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo-0125".to_string(),
            temperature: 0.0,
            timeout_seconds: 120,
            max_turns: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://docs.smith.langchain.com/".to_string(),
            timeout_seconds: 30,
            user_agent: concat!("research-agent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourceConfig {
    /// HTTP client shared by the page loader and the lookup tools.
    pub fn http_client(&self) -> Result<reqwest::Client, DomainError> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()
            .map_err(|e| DomainError::internal(format!("http client: {e}")))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub wikipedia: WikipediaToolConfig,
    pub arxiv: ArxivToolConfig,
    pub retriever: RetrieverToolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikipediaToolConfig {
    pub base_url: String,
    pub top_k_results: usize,
    pub doc_content_chars_max: usize,
    pub max_query_length: usize,
}

impl Default for WikipediaToolConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            top_k_results: 1,
            doc_content_chars_max: 200,
            max_query_length: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArxivToolConfig {
    pub base_url: String,
    pub top_k_results: usize,
    pub doc_content_chars_max: usize,
    pub max_query_length: usize,
}

impl Default for ArxivToolConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org".to_string(),
            top_k_results: 1,
            doc_content_chars_max: 100,
            max_query_length: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrieverToolConfig {
    pub name: String,
    pub description: String,
    pub no_results_message: String,
}

impl Default for RetrieverToolConfig {
    fn default() -> Self {
        Self {
            name: "langsmith_search".to_string(),
            description: "Search for information about LangSmith".to_string(),
            no_results_message: "No relevant documents found.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub agent: AgentPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads a YAML file; missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| DomainError::configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let c = &self.config;
        if c.llm.provider != "openai" {
            return Err(DomainError::configuration(format!(
                "unsupported llm.provider {:?}; only \"openai\" is available",
                c.llm.provider
            )));
        }
        if c.llm.model.trim().is_empty() {
            return Err(DomainError::configuration("llm.model must not be empty"));
        }
        if c.llm.max_turns == 0 {
            return Err(DomainError::configuration("llm.max_turns must be at least 1"));
        }
        if c.embedding.dimension == 0 {
            return Err(DomainError::configuration(
                "embedding.dimension must be at least 1",
            ));
        }
        if c.source.timeout_seconds == 0 {
            return Err(DomainError::configuration(
                "source.timeout_seconds must be at least 1",
            ));
        }
        if c.rag.top_k == 0 {
            return Err(DomainError::configuration("rag.top_k must be at least 1"));
        }
        if c.rag.chunk_size == 0 {
            return Err(DomainError::configuration("rag.chunk_size must be at least 1"));
        }
        if c.rag.chunk_overlap >= c.rag.chunk_size {
            return Err(DomainError::configuration(
                "rag.chunk_overlap must be smaller than rag.chunk_size",
            ));
        }
        if c.tools.wikipedia.top_k_results == 0 || c.tools.arxiv.top_k_results == 0 {
            return Err(DomainError::configuration(
                "tools.*.top_k_results must be at least 1",
            ));
        }
        if c.tools.retriever.name.trim().is_empty() {
            return Err(DomainError::configuration(
                "tools.retriever.name must not be empty",
            ));
        }
        Ok(())
    }
}

/// Returns the OpenAI credential, failing before any network call when it is absent.
pub fn require_api_key() -> Result<String, DomainError> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(DomainError::configuration(format!(
            "{API_KEY_ENV} is not set"
        ))),
    }
}

/// OpenAI client for the configured credential; honours `OPENAI_BASE_URL`.
pub fn openai_client() -> Result<openai::Client, DomainError> {
    let api_key = require_api_key()?;

    let mut builder = openai::Client::builder().api_key(api_key.as_str());
    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        builder = builder.base_url(&base_url);
    }

    builder
        .build()
        .map_err(|e| DomainError::configuration(format!("openai client: {e}")))
}

/// Serializes tests that touch the OpenAI environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
