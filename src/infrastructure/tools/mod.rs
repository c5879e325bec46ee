mod arxiv;
mod retriever;
mod wikipedia;

pub use arxiv::{ArxivClient, ArxivError, ArxivTool};
pub use retriever::{RetrieverError, RetrieverTool};
pub use wikipedia::{WikipediaClient, WikipediaError, WikipediaTool};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Arguments shared by every lookup tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryArgs {
    pub query: String,
}

pub(crate) fn query_parameters(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": description
            }
        },
        "required": ["query"]
    })
}

/// Keeps at most `max` characters, never splitting a code point.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
