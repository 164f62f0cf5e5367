//! Docsum Engine Library
//!
//! Client for a document question-answering server: upload documents, ask
//! questions, summarize the collection and save results as JSON or PDF.
//! It is used by both the `docsum` binary and integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// HTTP transport adapter
pub mod transport;

/// JSON/PDF artifact export
pub mod exporter;

/// Interaction state machine
pub mod session;

/// Text rendering of session state
pub mod view;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

/// Interactive shell
pub mod shell;
