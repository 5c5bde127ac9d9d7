pub mod dialect;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod runtime;
pub mod settings;
pub mod sources;
pub mod types;

pub use error::{IngestError, ParseWarning, StoreError};
pub use parser::parse_document;
