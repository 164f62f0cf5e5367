//! Error types and handling
//!
//! This module provides the shared error type used by the docsum client.
//! All errors implement the `ClientErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Nothing in the client is fatal: every failure can be retried by re-issuing
//! the user action, so almost every variant reports itself as recoverable.

use thiserror::Error;

/// Trait for client error extensions
///
/// Provides additional context for errors, including a user-friendly hint
/// and recoverability information.
pub trait ClientErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is a static string that never echoes server-supplied text.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable by retrying the action
    fn is_recoverable(&self) -> bool;
}

/// Main client error type
///
/// # Examples
///
/// ```
/// use docsum_sdk::errors::{ClientError, ClientErrorExt};
///
/// let error = ClientError::Network("connection refused".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let config_error = ClientError::Config("bad base_url".to_string());
/// assert!(!config_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Server responded with a failure
    #[error("Server error: {0}")]
    Server(String),

    // Export errors
    #[error("Export error: {0}")]
    Export(String),

    // Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientErrorExt for ClientError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Network(_) => "Could not reach the document server. Is it running?",
            Self::Server(_) => "The document server rejected the request",
            Self::Export(_) => "The artifact could not be saved. Check the download directory",
            Self::InvalidInput(_) => "Check the command arguments and try again",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A broken config needs a manual edit before anything will work
        !matches!(self, Self::Config(_))
    }
}
