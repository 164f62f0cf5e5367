//! Session data model
//!
//! Everything here lives in memory only and is discarded with the session.

use docsum_sdk::types::QueryResult;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;

/// Which gated operation is in flight
///
/// Upload, query and summarize share this single slot, so at most one of
/// them runs at any instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Uploading,
    Querying,
    Summarizing,
}

impl Activity {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Activity::Idle)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Idle => write!(f, "idle"),
            Activity::Uploading => write!(f, "uploading"),
            Activity::Querying => write!(f, "querying"),
            Activity::Summarizing => write!(f, "summarizing"),
        }
    }
}

/// The file picked for upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Where the content is read from at upload time
    pub path: PathBuf,

    /// Display name, also sent as the multipart file name
    pub name: String,

    /// Size in bytes when selected
    pub size: u64,
}

impl SelectedFile {
    /// Describe the file at `path`
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }

    /// Lower-cased extension with leading dot, if any
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }

    /// Reasons the server will probably reject this file
    ///
    /// Advisory only: the upload goes out regardless.
    pub fn advisories(&self, rules: &UploadConfig) -> Vec<String> {
        let mut warnings = Vec::new();

        let accepted = self
            .extension()
            .map(|ext| rules.accepted_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false);
        if !accepted {
            warnings.push(format!(
                "{} is not one of the accepted types ({})",
                self.name,
                rules.accepted_extensions.join(", ")
            ));
        }

        if self.size > rules.max_file_size_bytes() {
            warnings.push(format!(
                "{} is larger than {} MB",
                self.name, rules.max_file_size_mb
            ));
        }

        warnings
    }
}

/// Kind of the current upload status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Upload in flight
    Pending,
    /// Server accepted the file
    Success,
    /// Upload failed
    Error,
    /// Rejected before anything was sent
    Invalid,
}

/// Message describing the last upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    pub kind: StatusKind,
    pub text: String,
}

impl UploadStatus {
    pub fn pending() -> Self {
        Self {
            kind: StatusKind::Pending,
            text: "Uploading...".to_string(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: message.into(),
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            kind: StatusKind::Error,
            text: format!("Error: {}", message),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Invalid,
            text: message.into(),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StatusKind::Success => write!(f, "✓ {}", self.text),
            StatusKind::Error => write!(f, "✗ {}", self.text),
            StatusKind::Pending | StatusKind::Invalid => write!(f, "{}", self.text),
        }
    }
}

/// The last corpus summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Summary {
    /// Nothing requested yet, or a request is in flight
    #[default]
    Empty,
    /// Summary text from the server
    Ready(String),
    /// Normalized failure message
    Failed(String),
}

impl Summary {
    /// The text shown to the user; failures carry an `Error: ` prefix
    pub fn text(&self) -> String {
        match self {
            Summary::Empty => String::new(),
            Summary::Ready(text) => text.clone(),
            Summary::Failed(message) => format!("Error: {}", message),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// Mutable state behind a session
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub activity: Activity,
    pub selected_file: Option<SelectedFile>,
    pub upload_status: Option<UploadStatus>,
    pub query_text: String,
    pub query_result: Option<QueryResult>,
    pub summary: Summary,
}

/// Read-only copy of a session's state, for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub activity: Activity,
    pub selected_file: Option<SelectedFile>,
    pub upload_status: Option<UploadStatus>,
    pub query_text: String,
    pub query_result: Option<QueryResult>,
    pub summary: Summary,
}

impl SessionState {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            activity: self.activity,
            selected_file: self.selected_file.clone(),
            upload_status: self.upload_status.clone(),
            query_text: self.query_text.clone(),
            query_result: self.query_result.clone(),
            summary: self.summary.clone(),
        }
    }
}
