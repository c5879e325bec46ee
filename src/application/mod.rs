//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations, so ingestion and retrieval can run against fakes in tests.

pub mod services;

pub use services::{IngestReport, IngestService, RagService};
