//! Docsum SDK
//!
//! Shared wire types and errors for the docsum client.
//! The engine depends on this crate; it has no I/O of its own.

/// Error types and handling
pub mod errors;

/// Request and response bodies of the document server
pub mod types;

// Re-export commonly used types
pub use errors::{ClientError, ClientErrorExt};
pub use types::{
    ContextChunk, ErrorBody, QueryAnswer, QueryResult, SummaryResponse, UploadReceipt,
    CHUNK_PREVIEW_CHARS,
};
