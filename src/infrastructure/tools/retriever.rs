use rig::completion::ToolDefinition;
use rig::tool::Tool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::RagService;
use crate::infrastructure::config::RetrieverToolConfig;
use crate::infrastructure::tools::{query_parameters, QueryArgs};

#[derive(Debug, thiserror::Error)]
#[error("Retriever error: {0}")]
pub struct RetrieverError(pub String);

/// Similarity search over the indexed source page, exposed to the agent.
#[derive(Clone)]
pub struct RetrieverTool {
    rag: Arc<RagService>,
    config: RetrieverToolConfig,
}

impl RetrieverTool {
    pub fn new(rag: Arc<RagService>, config: RetrieverToolConfig) -> Self {
        Self { rag, config }
    }

    pub async fn search(&self, query: &str) -> Result<String, RetrieverError> {
        info!(tool = %self.config.name, query, "invoking tool");

        let results = self
            .rag
            .retrieve(query)
            .await
            .map_err(|e| RetrieverError(e.to_string()))?;

        let output = results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        debug!(tool = %self.config.name, hits = results.len(), chars = output.len(), "tool finished");

        Ok(if output.is_empty() {
            self.config.no_results_message.clone()
        } else {
            output
        })
    }
}

impl Tool for RetrieverTool {
    const NAME: &'static str = "langsmith_search";

    type Error = RetrieverError;
    type Args = QueryArgs;
    type Output = String;

    fn name(&self) -> String {
        self.config.name.clone()
    }

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            parameters: query_parameters("query to look up in retriever"),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.search(&args.query).await
    }
}
