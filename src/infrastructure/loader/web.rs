use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::domain::{ports::DocumentLoader, Document, DomainError};
use crate::infrastructure::config::SourceConfig;
use crate::infrastructure::loader::html::{html_to_text, PageMetadata};

/// Fetches one web page over HTTP and turns it into a [`Document`].
pub struct WebPageLoader {
    http: reqwest::Client,
}

impl WebPageLoader {
    pub fn new(config: &SourceConfig) -> Result<Self, DomainError> {
        Ok(Self {
            http: config.http_client()?,
        })
    }
}

fn looks_like_html(content_type: &str, body: &str) -> bool {
    if content_type.contains("html") {
        return true;
    }
    let head: String = body.trim_start().chars().take(15).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[async_trait]
impl DocumentLoader for WebPageLoader {
    #[instrument(skip(self))]
    async fn load(&self, source: &str) -> Result<Document, DomainError> {
        let response = self.http.get(source).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::external(format!(
                "GET {source} returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let body = response.text().await?;
        debug!(bytes = body.len(), content_type = %content_type, "page fetched");

        if !looks_like_html(&content_type, &body) {
            return Ok(Document::new(source, body));
        }

        let meta = PageMetadata::extract(&body);
        Ok(Document::new(source, html_to_text(&body))
            .with_title(meta.title)
            .with_description(meta.description)
            .with_language(meta.language))
    }
}
