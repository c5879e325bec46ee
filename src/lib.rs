//! Question-answering agent that combines Wikipedia, arXiv and a retrieval
//! index built from one web page.
//!
//! The crate is layered: [`domain`] holds entities and ports, [`application`]
//! orchestrates ingestion and retrieval, and [`infrastructure`] wires in the
//! OpenAI provider, HTTP sources and the in-memory vector index.

pub mod application;
pub mod domain;
pub mod infrastructure;
