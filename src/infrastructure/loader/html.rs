//! Reduces an HTML page to the readable text a retrieval index wants.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static NON_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<head\b.*?</head\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<svg\b.*?</svg\s*>|<template\b.*?</template\s*>",
    )
    .unwrap()
});

static BLOCK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|br|hr|li|ul|ol|dl|dt|dd|h[1-6]|tr|table|thead|tbody|section|article|aside|header|footer|nav|main|pre|blockquote|figure|figcaption|details|summary)\b[^>]*>",
    )
    .unwrap()
});

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:(\d+)|[xX]([0-9a-fA-F]+));").unwrap());

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\u{a0}\u{200b}]+").unwrap());

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b[^>]*\bname\s*=\s*["']description["'][^>]*>"#).unwrap()
});

static CONTENT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static HTML_LANG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<html\b[^>]*\blang\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// Head metadata a page loader records next to the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl PageMetadata {
    pub fn extract(html: &str) -> Self {
        let title = TITLE
            .captures(html)
            .map(|c| collapse_inline(&decode_entities(&c[1])))
            .filter(|t| !t.is_empty());

        let description = META_DESCRIPTION
            .find(html)
            .and_then(|tag| CONTENT_ATTR.captures(tag.as_str()))
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| collapse_inline(&decode_entities(m.as_str())))
            .filter(|d| !d.is_empty());

        let language = HTML_LANG.captures(html).map(|c| c[1].trim().to_string());

        Self {
            title,
            description,
            language,
        }
    }
}

/// Strips markup and keeps paragraph structure as blank-line separated blocks.
pub fn html_to_text(html: &str) -> String {
    let text = COMMENTS.replace_all(html, "");
    let text = NON_CONTENT.replace_all(&text, "");
    let text = BLOCK_TAGS.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = collapse_inline(line);
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks.join("\n\n")
}

fn collapse_inline(s: &str) -> String {
    INLINE_SPACE.replace_all(s, " ").trim().to_string()
}

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}");

    let numeric = NUMERIC_ENTITY.replace_all(&named, |c: &Captures| {
        let code = match (c.get(1), c.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| c[0].to_string())
    });

    // last, so "&amp;lt;" stays literal "&lt;"
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Get started with LangSmith | &#x1F99C;&#xFE0F;&#x1F6E0;&#xFE0F; LangSmith</title>
  <meta name="description" content="LangSmith is a platform for building production-grade LLM applications.">
  <style>body { color: red; }</style>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <!-- tracking pixel -->
  <script>window.dataLayer = [];</script>
  <h1>Get started</h1>
  <p>LangSmith lets you <b>trace</b> &amp; evaluate
     your    application.</p>
  <ul><li>Observability</li><li>Evals</li></ul>
</body>
</html>"#;

    #[test]
    fn test_html_to_text_strips_markup() {
        let text = html_to_text(PAGE);

        assert!(!text.contains('<'));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("dataLayer"));
        assert!(!text.contains("tracking pixel"));
        assert!(text.contains("LangSmith lets you trace & evaluate\nyour application."));
        assert!(text.contains("Get started"));
        assert!(text.contains("Observability\n\nEvals") || text.contains("Observability\nEvals"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_extract_metadata() {
        let meta = PageMetadata::extract(PAGE);

        assert_eq!(meta.language.as_deref(), Some("en"));
        assert_eq!(
            meta.description.as_deref(),
            Some("LangSmith is a platform for building production-grade LLM applications.")
        );
        let title = meta.title.unwrap();
        assert!(title.starts_with("Get started with LangSmith | "));
        assert!(title.ends_with(" LangSmith"));
    }

    #[test]
    fn test_extract_metadata_missing() {
        assert_eq!(PageMetadata::extract("<p>bare</p>"), PageMetadata::default());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp;lt; b"), "a &lt; b");
        assert_eq!(decode_entities("&#65;&#x42;&quot;"), "AB\"");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }
}
