use chrono::DateTime;
use regex::Regex;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::infrastructure::config::ArxivToolConfig;
use crate::infrastructure::tools::{query_parameters, truncate_chars, QueryArgs};

const NO_RESULTS: &str = "No good Arxiv Result was found";

static ARXIV_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d{2}(?:0[1-9]|1[0-2])\.\d{4,5}(?:v\d+)?|[a-z][a-z\-]*(?:\.[A-Z]{2})?/\d{7}(?:v\d+)?)$",
    )
    .unwrap()
});

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>").unwrap());
static ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<id>(.*?)</id>").unwrap());
static UPDATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<updated>(.*?)</updated>").unwrap());
static PUBLISHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<published>(.*?)</published>").unwrap());
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").unwrap());
static SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<summary\b[^>]*>(.*?)</summary>").unwrap());
static AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<author\b[^>]*>\s*<name>(.*?)</name>").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Arxiv error: {0}")]
pub struct ArxivError(pub String);

impl From<reqwest::Error> for ArxivError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// One feed entry, already whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivPaper {
    pub published: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
}

impl ArxivPaper {
    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

/// True when every token of the query is an arXiv identifier such as
/// `1605.08386v1` or `hep-th/9901001`.
pub fn is_arxiv_identifier(query: &str) -> bool {
    let mut tokens = query.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| ARXIV_ID.is_match(t))
}

fn clean(raw: &str) -> String {
    let decoded = raw
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| clean(&c[1]))
}

fn date_only(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| timestamp.chars().take(10).collect())
}

/// Parses an arXiv Atom feed. The API reports bad queries as a single
/// entry whose id points at `/api/errors`.
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivPaper>, ArxivError> {
    let mut papers = Vec::new();

    for entry in ENTRY.captures_iter(xml) {
        let body = &entry[1];

        if capture(&ID, body).is_some_and(|id| id.contains("/api/errors")) {
            let reason = capture(&SUMMARY, body).unwrap_or_else(|| "unknown error".to_string());
            return Err(ArxivError(reason));
        }

        let Some(title) = capture(&TITLE, body) else {
            continue;
        };
        let timestamp = capture(&UPDATED, body)
            .or_else(|| capture(&PUBLISHED, body))
            .unwrap_or_default();

        papers.push(ArxivPaper {
            published: date_only(&timestamp),
            title,
            authors: AUTHOR
                .captures_iter(body)
                .map(|c| clean(&c[1]))
                .collect(),
            summary: capture(&SUMMARY, body).unwrap_or_default(),
        });
    }

    Ok(papers)
}

/// Client for the arXiv export query API.
#[derive(Clone)]
pub struct ArxivClient {
    http: reqwest::Client,
    query_url: String,
}

impl ArxivClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            query_url: format!("{}/api/query", base_url.trim_end_matches('/')),
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ArxivPaper>, ArxivError> {
        let (key, value) = if is_arxiv_identifier(query) {
            ("id_list", query.split_whitespace().collect::<Vec<_>>().join(","))
        } else {
            ("search_query", query.to_string())
        };
        let limit = limit.to_string();

        let response = self
            .http
            .get(&self.query_url)
            .query(&[
                (key, value.as_str()),
                ("start", "0"),
                ("max_results", limit.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // bad queries come back as 400 with an error entry in the feed
        let papers = parse_feed(&body)?;
        if !status.is_success() {
            return Err(ArxivError(format!("arXiv returned {status}")));
        }
        Ok(papers)
    }
}

/// Preprint lookup returning metadata and abstracts of the top papers.
#[derive(Clone)]
pub struct ArxivTool {
    client: ArxivClient,
    config: ArxivToolConfig,
}

impl ArxivTool {
    pub fn new(config: ArxivToolConfig, http: reqwest::Client) -> Self {
        Self {
            client: ArxivClient::new(&config.base_url, http),
            config,
        }
    }

    pub async fn run(&self, query: &str) -> Result<String, ArxivError> {
        info!(tool = Self::NAME, query, "invoking tool");
        let query = truncate_chars(query, self.config.max_query_length);

        let papers = self
            .client
            .search(&query, self.config.top_k_results)
            .await?;
        if papers.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let rendered = papers
            .iter()
            .take(self.config.top_k_results)
            .map(ArxivPaper::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        let output = truncate_chars(&rendered, self.config.doc_content_chars_max);
        debug!(tool = Self::NAME, papers = papers.len(), chars = output.len(), "tool finished");
        Ok(output)
    }
}

impl Tool for ArxivTool {
    const NAME: &'static str = "arxiv";

    type Error = ArxivError;
    type Args = QueryArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "A wrapper around Arxiv.org. Useful for when you need to answer \
                questions about Physics, Mathematics, Computer Science, Quantitative Biology, \
                Quantitative Finance, Statistics, Electrical Engineering, and Economics from \
                scientific articles on arxiv.org. Input should be a search query."
                .to_string(),
            parameters: query_parameters("search query to look up"),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.run(&args.query).await
    }
}
