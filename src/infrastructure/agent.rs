use rig::client::CompletionClient;
use rig::completion::{Prompt, PromptError};
use rig::providers::openai;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::application::RagService;
use crate::domain::{entities::render_transcript, DomainError, Message};
use crate::infrastructure::config::{openai_client, AppConfig};
use crate::infrastructure::tools::{ArxivTool, RetrieverTool, WikipediaTool};

/// Returned instead of an answer when the tool loop runs out of turns.
pub const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Tool-calling agent over Wikipedia, the indexed source page and arXiv.
pub struct ResearchAgent {
    client: openai::Client,
    model: String,
    temperature: f64,
    system_prompt: String,
    max_turns: usize,
    timeout: Duration,
    wikipedia: WikipediaTool,
    retriever: RetrieverTool,
    arxiv: ArxivTool,
}

impl ResearchAgent {
    /// Fails with a configuration error when `OPENAI_API_KEY` is absent.
    pub fn new(rag: Arc<RagService>, config: &AppConfig) -> Result<Self, DomainError> {
        Self::with_client(openai_client()?, rag, config)
    }

    pub fn with_client(
        client: openai::Client,
        rag: Arc<RagService>,
        config: &AppConfig,
    ) -> Result<Self, DomainError> {
        let c = &config.config;
        let http = c.source.http_client()?;

        Ok(Self {
            client,
            model: c.llm.model.clone(),
            temperature: c.llm.temperature,
            system_prompt: config.prompts.agent.system.clone(),
            max_turns: c.llm.max_turns,
            timeout: Duration::from_secs(c.llm.timeout_seconds),
            wikipedia: WikipediaTool::new(c.tools.wikipedia.clone(), http.clone()),
            retriever: RetrieverTool::new(rag, c.tools.retriever.clone()),
            arxiv: ArxivTool::new(c.tools.arxiv.clone(), http),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ask(&self, query: &str) -> Result<String, DomainError> {
        self.ask_with_history(query, &[]).await
    }

    #[instrument(skip(self, history), fields(model = %self.model, history = history.len()))]
    pub async fn ask_with_history(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<String, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::validation("query must not be empty"));
        }

        // tools are listed in the order the model sees them
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&self.system_prompt)
            .temperature(self.temperature)
            .tool(self.wikipedia.clone())
            .tool(self.retriever.clone())
            .tool(self.arxiv.clone())
            .build();

        let prompt = build_prompt(query, history);

        let request = agent.prompt(prompt.as_str()).multi_turn(self.max_turns);
        let result = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DomainError::timeout("Agent execution timed out"))?;
        let answer = settle(result)?;

        info!(chars = answer.len(), "agent finished");
        Ok(answer)
    }
}

fn settle(result: Result<String, PromptError>) -> Result<String, DomainError> {
    match result {
        Ok(answer) => Ok(answer),
        Err(PromptError::MaxDepthError { max_depth, .. }) => {
            warn!(max_depth, "agent hit the turn limit");
            Ok(STOPPED_MESSAGE.to_string())
        }
        Err(e) => Err(DomainError::external(format!("Agent failed: {e}"))),
    }
}

fn build_prompt(query: &str, history: &[Message]) -> String {
    if history.is_empty() {
        return query.to_string();
    }

    format!(
        "Previous conversation:\n{}\n\nCurrent message from user: {}",
        render_transcript(history),
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::rag::testing::KeywordEmbedding;
    use crate::domain::MessageRole;
    use crate::infrastructure::config::{API_KEY_ENV, ENV_LOCK};
    use crate::infrastructure::InMemoryVectorStore;

    fn rag() -> Arc<RagService> {
        Arc::new(RagService::new(
            Arc::new(KeywordEmbedding::new(vec!["langsmith"])),
            Arc::new(InMemoryVectorStore::new()),
            4,
        ))
    }

    fn offline_client() -> openai::Client {
        openai::Client::builder()
            .api_key("sk-test")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_without_key() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved = std::env::var(API_KEY_ENV).ok();
        std::env::remove_var(API_KEY_ENV);

        let result = ResearchAgent::new(rag(), &AppConfig::default());
        assert!(matches!(result, Err(DomainError::Configuration(_))));

        if let Some(key) = saved {
            std::env::set_var(API_KEY_ENV, key);
        }
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_query() {
        let agent = ResearchAgent::with_client(offline_client(), rag(), &AppConfig::default())
            .unwrap();
        assert_eq!(agent.model(), "gpt-3.5-turbo-0125");

        let err = agent.ask("   ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_turn_limit_yields_stopped_message() {
        let result = Err(PromptError::MaxDepthError {
            max_depth: 15,
            chat_history: Box::new(Vec::new()),
            prompt: Box::new(rig::completion::Message::user("Tell me about LangSmith")),
        });
        assert_eq!(settle(result).unwrap(), STOPPED_MESSAGE);
        assert_eq!(settle(Ok("answer".to_string())).unwrap(), "answer");
    }

    #[test]
    fn test_build_prompt_without_history() {
        assert_eq!(build_prompt("Tell me about LangSmith", &[]), "Tell me about LangSmith");
    }

    #[test]
    fn test_build_prompt_with_history() {
        let history = vec![
            Message::new(MessageRole::User, "What is LangSmith?"),
            Message::new(MessageRole::Assistant, "A platform for LLM apps."),
        ];

        assert_eq!(
            build_prompt("Does it support evals?", &history),
            "Previous conversation:\nUser: What is LangSmith?\nAssistant: A platform for LLM apps.\n\nCurrent message from user: Does it support evals?"
        );
    }
}
