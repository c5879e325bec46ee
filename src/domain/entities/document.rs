use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, TextSplitter};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// A fetched source page reduced to plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            title: None,
            description: None,
            language: None,
            content: content.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(document_id: Uuid, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            chunk_index,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: Option<String>,
    /// Byte offset of the chunk inside the document content.
    pub start_offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits a document into overlapping chunks of at most `chunk_size` characters.
///
/// Splitting prefers paragraph, then line, then word boundaries. Consecutive
/// chunks share up to `chunk_overlap` characters. Whitespace-only pieces are
/// dropped and the remaining chunks are numbered from 0.
pub fn split_content(
    document: &Document,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<DocumentChunk>, DomainError> {
    if chunk_size == 0 {
        return Err(DomainError::validation("chunk size must be greater than zero"));
    }
    if chunk_overlap >= chunk_size {
        return Err(DomainError::validation(format!(
            "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
        )));
    }

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|e| DomainError::validation(e.to_string()))?;
    let splitter = TextSplitter::new(config);

    let chunks = splitter
        .chunk_indices(&document.content)
        .filter(|(_, text)| !text.trim().is_empty())
        .enumerate()
        .map(|(index, (offset, text))| {
            DocumentChunk::new(document.id, text, index).with_metadata(ChunkMetadata {
                source: Some(document.source.clone()),
                start_offset: offset,
            })
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str) -> Document {
        Document::new("https://docs.example.com/", content)
    }

    #[test]
    fn test_split_content_single_chunk() {
        let doc = page("Hello world.\n\nThis is a test.");
        let chunks = split_content(&doc, 100, 20).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello world.\n\nThis is a test.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].document_id, doc.id);
        assert_eq!(
            chunks[0].metadata.source.as_deref(),
            Some("https://docs.example.com/")
        );
    }

    #[test]
    fn test_split_content_respects_chunk_size() {
        let paragraph = "LangSmith traces every step of an application run. ".repeat(10);
        let content = vec![paragraph; 6].join("\n\n");
        let doc = page(&content);

        let chunks = split_content(&doc, 1000, 200).unwrap();

        assert!(chunks.len() >= 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.content.chars().count() <= 1000);
            assert_eq!(chunk.chunk_index, i);
        }
        assert!(chunks
            .windows(2)
            .all(|w| w[0].metadata.start_offset < w[1].metadata.start_offset));
    }

    #[test]
    fn test_split_content_empty() {
        let chunks = split_content(&page(""), 100, 10).unwrap();
        assert!(chunks.is_empty());

        let chunks = split_content(&page("  \n\n  "), 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_split_content_rejects_overlap_not_smaller_than_size() {
        let err = split_content(&page("text"), 100, 100).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = split_content(&page("text"), 0, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
