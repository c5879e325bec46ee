use clap::Parser;
use research_agent::application::{IngestService, RagService};
use research_agent::domain::Conversation;
use research_agent::infrastructure::{
    AppConfig, InMemoryVectorStore, OpenAiEmbedding, ResearchAgent, WebPageLoader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_QUERY: &str = "Tell me about LangSmith";

/// Answer a question with Wikipedia, arXiv and an indexed documentation page.
#[derive(Debug, Parser)]
#[command(name = "research-agent", version)]
struct Cli {
    /// Question to ask the agent
    #[arg(default_value = DEFAULT_QUERY)]
    query: String,

    /// YAML configuration file
    #[arg(long, env = "RESEARCH_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Page to load into the retrieval index
    #[arg(long)]
    source_url: Option<String>,

    /// Chat model name
    #[arg(long)]
    model: Option<String>,

    /// Keep reading questions from stdin after the first answer
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = cli.source_url {
        config.config.source.url = url;
    }
    if let Some(model) = cli.model {
        config.config.llm.model = model;
    }
    config.validate()?;

    // fails on a missing OPENAI_API_KEY before the page is fetched
    let embedding = Arc::new(OpenAiEmbedding::from_config(&config.config.embedding)?);
    let vector_store = Arc::new(InMemoryVectorStore::new());
    let rag = Arc::new(RagService::new(
        embedding,
        vector_store,
        config.config.rag.top_k,
    ));

    let loader = Arc::new(WebPageLoader::new(&config.config.source)?);
    let report = IngestService::new(loader, rag.clone())
        .with_chunking(config.config.rag.chunk_size, config.config.rag.chunk_overlap)
        .ingest(&config.config.source.url)
        .await?;
    info!(
        chunks = report.chunks,
        indexed = rag.indexed_chunks().await?,
        "retrieval index ready"
    );

    let agent = ResearchAgent::new(rag, &config)?;
    info!(model = agent.model(), "agent ready");

    let answer = agent.ask(&cli.query).await?;
    println!("{answer}");

    if cli.interactive {
        let mut conversation = Conversation::new();
        conversation.record_exchange(cli.query.trim(), answer);
        chat_loop(&agent, &mut conversation).await?;
    }

    Ok(())
}

async fn chat_loop(agent: &ResearchAgent, conversation: &mut Conversation) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let answer = agent
            .ask_with_history(question, conversation.history())
            .await?;
        println!("{answer}");
        conversation.record_exchange(question, answer);
    }

    info!(
        conversation = %conversation.id,
        turns = conversation.history().len() / 2,
        "session ended"
    );
    Ok(())
}
