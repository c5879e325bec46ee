mod conversation;
mod document;
mod embedding;

pub use conversation::{Conversation, Message, MessageRole};
pub(crate) use conversation::render_transcript;
pub use document::{split_content, ChunkMetadata, Document, DocumentChunk, SearchResult};
pub use embedding::Embedding;
