//! Wire types exchanged with the document server
//!
//! These mirror the JSON bodies of the server's upload, query and summarize
//! endpoints. Unknown fields on context chunks are preserved verbatim so that
//! exports send back exactly what the server produced.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of characters of a context chunk ever shown to the user
pub const CHUNK_PREVIEW_CHARS: usize = 200;

/// Success body of the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Human-readable confirmation from the server
    pub message: String,

    /// Server-assigned identifier of the stored document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// Original file name as recorded by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A retrieved text fragment returned alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Chunk text
    pub text: String,

    /// Any other fields the server attached (metadata, scores, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextChunk {
    /// Create a chunk with no extra fields
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }

    /// First [`CHUNK_PREVIEW_CHARS`] characters of the text, with `...`
    /// appended when the text was cut
    pub fn preview(&self) -> String {
        match self.text.char_indices().nth(CHUNK_PREVIEW_CHARS) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }

    /// Name of the document this chunk came from, when the server says so
    pub fn source_filename(&self) -> Option<&str> {
        self.extra
            .get("metadata")
            .and_then(|m| m.get("filename"))
            .and_then(Value::as_str)
    }
}

/// A successful answer from the query endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Generated answer text
    pub answer: String,

    /// The query as echoed by the server
    #[serde(default)]
    pub query: String,

    /// Retrieved chunks, in ranking order
    #[serde(default)]
    pub context: Vec<ContextChunk>,
}

/// Outcome of the most recent query
///
/// Serialized untagged so it has exactly the shape the server and the
/// exporter use: `{answer, query, context}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// The server produced an answer
    Answered(QueryAnswer),

    /// The query failed; `error` is the normalized failure message
    Failed { error: String },
}

impl QueryResult {
    /// The answer, if this result carries a non-empty one
    pub fn answer(&self) -> Option<&QueryAnswer> {
        match self {
            Self::Answered(answer) if !answer.answer.is_empty() => Some(answer),
            _ => None,
        }
    }

    /// The error message, if the query failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Answered(_) => None,
        }
    }
}

/// Success body of the summarize endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// Generated summary text
    pub summary: String,
}

/// Failure body produced by the server
///
/// `detail` is usually a string, but request validation failures carry a
/// structured list, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Human-readable rendering of `detail`, if one is present and non-empty
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
