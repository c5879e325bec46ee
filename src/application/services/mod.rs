mod ingest;
pub(crate) mod rag;

pub use ingest::{IngestReport, IngestService};
pub use rag::RagService;
