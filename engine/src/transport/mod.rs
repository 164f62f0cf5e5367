//! Transport Adapter
//!
//! Boundary between in-memory requests and the document server's HTTP API.
//! Every call goes to one of a fixed set of endpoints under a common base
//! URL, carries an optional multipart form, and comes back either as a
//! decoded payload or as a [`TransportError`] holding a single human-readable
//! message. Nothing escapes this boundary as a panic or an untyped error.
//!
//! Failure messages are normalized in priority order:
//! 1. the server-supplied `detail` field of a JSON error body
//! 2. a generic transport message (status code, connection failure, ...)

use async_trait::async_trait;
use docsum_sdk::types::ErrorBody;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

pub mod http;

pub use http::HttpTransport;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// The server endpoints the client knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Upload and index a document
    Upload,
    /// Ask a question against indexed documents
    Query,
    /// Summarize the whole corpus
    Summarize,
    /// Render a query result as a JSON document
    ExportJson,
    /// Render text as a PDF document
    ExportPdf,
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Upload => "/upload",
            Endpoint::Query => "/query",
            Endpoint::Summarize => "/summarize",
            Endpoint::ExportJson => "/download/json",
            Endpoint::ExportPdf => "/download/pdf",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// How the response body should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Decode the body as JSON
    Json,
    /// Return the raw bytes untouched
    Binary,
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// Plain text field
    Text { name: String, value: String },
    /// File field with its content and display name
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    /// Field name
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// A multipart form payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    fields: Vec<FormField>,
}

impl Form {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.fields.push(FormField::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    /// Fields in insertion order
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Value of the first text field with this name
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            FormField::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Consume the form, yielding its fields
    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }
}

/// A successful response
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Decoded JSON body
    Json(Value),
    /// Raw body bytes
    Binary(Vec<u8>),
}

impl Response {
    /// Deserialize a JSON response into a typed body
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Response::Json(value) => serde_json::from_value(value).map_err(|e| {
                TransportError::decode(format!("Unexpected response from server: {}", e))
            }),
            Response::Binary(_) => Err(TransportError::decode(
                "Expected a JSON response but received binary data",
            )),
        }
    }

    /// Take the raw bytes of a binary response
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Response::Binary(bytes) => Ok(bytes),
            Response::Json(value) => Ok(value.to_string().into_bytes()),
        }
    }
}

/// Category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The server answered with a non-success status
    Server { status: u16 },
    /// The request never got a response
    Network,
    /// The response could not be decoded
    Decode,
}

/// Normalized transport failure
///
/// `message` is the single human-readable string the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    /// Failure reported by the server
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Server { status },
            message: message.into(),
        }
    }

    /// Failure before any response arrived
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            message: message.into(),
        }
    }

    /// Response arrived but was unusable
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Decode,
            message: message.into(),
        }
    }

    /// HTTP status, when the server responded
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            TransportErrorKind::Server { status } => Some(status),
            _ => None,
        }
    }

    /// Build the normalized error for a non-success response body
    ///
    /// Prefers the server's `detail` field and falls back to a generic
    /// status message when the body carries none.
    pub fn from_response_body(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message());

        match detail {
            Some(message) => Self::server(status, message),
            None => Self::server(status, format!("Request failed with status code {}", status)),
        }
    }
}

/// Issues requests against the document server
///
/// Implementations must turn every failure into a [`TransportError`];
/// callers rely on receiving either a value or a normalized error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `endpoint` and interpret the body per `kind`
    async fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Form>,
        kind: ResponseKind,
    ) -> Result<Response>;
}
