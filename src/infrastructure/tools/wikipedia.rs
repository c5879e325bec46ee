use futures::future::try_join_all;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;
use tracing::{debug, info};

use crate::infrastructure::config::WikipediaToolConfig;
use crate::infrastructure::tools::{query_parameters, truncate_chars, QueryArgs};

const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, thiserror::Error)]
#[error("Wikipedia error: {0}")]
pub struct WikipediaError(pub String);

impl From<reqwest::Error> for WikipediaError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
}

/// Page title and lead-section summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiSummary {
    pub title: String,
    pub summary: String,
}

/// Thin client over the MediaWiki action API.
#[derive(Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: format!("{}/w/api.php", base_url.trim_end_matches('/')),
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, WikipediaError> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srprop", ""),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// Plain-text intro of `title`, following redirects. `None` for missing pages.
    pub async fn summary(&self, title: &str) -> Result<Option<WikiSummary>, WikipediaError> {
        let response: ExtractResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|page| !page.missing)
            .and_then(|page| {
                let summary = page.extract?.trim().to_string();
                (!summary.is_empty()).then_some(WikiSummary {
                    title: page.title,
                    summary,
                })
            }))
    }
}

/// Encyclopedia lookup returning the top pages' summaries.
#[derive(Clone)]
pub struct WikipediaTool {
    client: WikipediaClient,
    config: WikipediaToolConfig,
}

impl WikipediaTool {
    pub fn new(config: WikipediaToolConfig, http: reqwest::Client) -> Self {
        Self {
            client: WikipediaClient::new(&config.base_url, http),
            config,
        }
    }

    pub async fn run(&self, query: &str) -> Result<String, WikipediaError> {
        info!(tool = Self::NAME, query, "invoking tool");
        let query = truncate_chars(query, self.config.max_query_length);

        let titles = self
            .client
            .search(&query, self.config.top_k_results)
            .await?;
        if titles.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let pages = try_join_all(titles.iter().map(|t| self.client.summary(t))).await?;
        let summaries: Vec<String> = pages
            .into_iter()
            .flatten()
            .map(|page| format!("Page: {}\nSummary: {}", page.title, page.summary))
            .collect();

        if summaries.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let output = truncate_chars(&summaries.join("\n\n"), self.config.doc_content_chars_max);
        debug!(tool = Self::NAME, pages = summaries.len(), chars = output.len(), "tool finished");
        Ok(output)
    }
}

impl Tool for WikipediaTool {
    const NAME: &'static str = "wikipedia";

    type Error = WikipediaError;
    type Args = QueryArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "A wrapper around Wikipedia. Useful for when you need to answer \
                general questions about people, places, companies, facts, historical \
                events, or other subjects. Input should be a search query."
                .to_string(),
            parameters: query_parameters("query to look up on wikipedia"),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.run(&args.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(server: &MockServer, chars_max: usize) -> WikipediaTool {
        WikipediaTool::new(
            WikipediaToolConfig {
                base_url: server.uri(),
                top_k_results: 1,
                doc_content_chars_max: chars_max,
                max_query_length: 300,
            },
            reqwest::Client::new(),
        )
    }

    async fn mount_search(server: &MockServer, titles: &[&str]) {
        let hits: Vec<_> = titles.iter().map(|t| json!({ "title": t })).collect();
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "query": { "search": hits } })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_formats_and_truncates() {
        let server = MockServer::start().await;
        mount_search(&server, &["LangChain"]).await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .and(query_param("titles", "LangChain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": [{
                    "pageid": 1,
                    "title": "LangChain",
                    "extract": "LangChain is a software framework that helps facilitate the integration of large language models into applications."
                }]}
            })))
            .mount(&server)
            .await;

        let full = tool(&server, 4000).run("langchain").await.unwrap();
        assert!(full.starts_with("Page: LangChain\nSummary: LangChain is a software framework"));

        let short = tool(&server, 29).run("langchain").await.unwrap();
        assert_eq!(short, "Page: LangChain\nSummary: Lang");
    }

    #[tokio::test]
    async fn test_run_no_hits() {
        let server = MockServer::start().await;
        mount_search(&server, &[]).await;

        let output = tool(&server, 200).run("qwxzzyq").await.unwrap();
        assert_eq!(output, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_run_skips_missing_pages() {
        let server = MockServer::start().await;
        mount_search(&server, &["Ghost"]).await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": [{ "title": "Ghost", "missing": true }] }
            })))
            .mount(&server)
            .await;

        let output = tool(&server, 200).run("ghost").await.unwrap();
        assert_eq!(output, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_run_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(tool(&server, 200).run("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_run_truncates_long_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "b".repeat(300).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "query": { "search": [] } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = tool(&server, 200).run(&"b".repeat(400)).await.unwrap();
        assert_eq!(output, NO_RESULTS);
    }
}
