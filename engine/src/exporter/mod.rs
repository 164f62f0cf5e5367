//! Artifact Exporter
//!
//! Turns an in-memory result into a saved file: the server renders the
//! artifact (JSON or PDF), the exporter names it and writes it into the
//! download directory.
//!
//! # File names
//!
//! - JSON: `query_result_<millis>.json`
//! - PDF:  `<title>_<millis>.pdf`, with every whitespace run and path
//!   separator in the title replaced by `_`
//!
//! The timestamp comes from an injectable [`Clock`].
//!
//! # Failures
//!
//! Export failures never touch session state. They are reported through the
//! [`Notifier`] as an out-of-band alert and returned to the caller.

use docsum_sdk::types::QueryAnswer;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::transport::{Endpoint, Form, ResponseKind, Transport, TransportError};

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

/// Collapses runs of whitespace and path separators in titles
static UNSAFE_TITLE_CHARS: OnceLock<Regex> = OnceLock::new();

/// Give up renaming after this many collisions
const MAX_NAME_ATTEMPTS: usize = 100;

/// Errors that can occur while exporting an artifact
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Failed to save {file_name}: {reason}")]
    Save { file_name: String, reason: String },
}

/// Out-of-band channel for failures the user must acknowledge
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Prints alerts to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, message: &str) {
        tracing::error!("{}", message);
        eprintln!("\n[!] {}\n", message);
    }
}

/// Keeps alerts in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    alerts: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts raised so far, oldest first
    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }
}

/// Destination for exported bytes
pub trait ArtifactSink: Send + Sync {
    /// Store `bytes` under `file_name`, returning where they ended up
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Saves artifacts into a directory
///
/// Bytes are written to a temporary file in the target directory and only
/// moved to their final name once fully written. The temporary file is
/// removed whenever a step fails. An existing file is never overwritten;
/// the name gets a ` (n)` suffix instead.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save_error(file_name: &str, reason: impl ToString) -> ExportError {
        ExportError::Save {
            file_name: file_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".docsum-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(|e| Self::save_error(file_name, e))?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| Self::save_error(file_name, e))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = self.dir.join(numbered_name(file_name, attempt));
            match tmp.persist_noclobber(&target) {
                Ok(_) => {
                    tracing::info!("Saved {} ({} bytes)", target.display(), bytes.len());
                    return Ok(target);
                }
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    tmp = e.file;
                }
                Err(e) => return Err(Self::save_error(file_name, e.error)),
            }
        }

        Err(Self::save_error(file_name, "too many files with this name"))
    }
}

/// `report.pdf` -> `report (2).pdf` for attempt 2; attempt 0 is the plain name
fn numbered_name(file_name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, attempt, ext),
        _ => format!("{} ({})", file_name, attempt),
    }
}

/// File name for a JSON export
pub fn json_file_name(millis: i64) -> String {
    format!("query_result_{}.json", millis)
}

/// File name for a PDF export of a document titled `title`
pub fn pdf_file_name(title: &str, millis: i64) -> String {
    let pattern = UNSAFE_TITLE_CHARS
        .get_or_init(|| Regex::new(r"[\s/\\]+").expect("Invalid title pattern"));
    format!("{}_{}.pdf", pattern.replace_all(title, "_"), millis)
}

/// Requests rendered artifacts and saves them
pub struct ArtifactExporter {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn ArtifactSink>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl ArtifactExporter {
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<dyn ArtifactSink>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            sink,
            clock,
            notifier,
        }
    }

    /// Export a query answer as JSON
    ///
    /// `fallback_query` is sent when the answer carries no query of its own.
    pub async fn export_json(
        &self,
        answer: &QueryAnswer,
        fallback_query: &str,
    ) -> Result<PathBuf, ExportError> {
        let result = self.try_export_json(answer, fallback_query).await;
        self.report(result, "JSON")
    }

    /// Export arbitrary text as a PDF document titled `title`
    pub async fn export_pdf(&self, content: &str, title: &str) -> Result<PathBuf, ExportError> {
        let result = self.try_export_pdf(content, title).await;
        self.report(result, "PDF")
    }

    async fn try_export_json(
        &self,
        answer: &QueryAnswer,
        fallback_query: &str,
    ) -> Result<PathBuf, ExportError> {
        let query = if answer.query.is_empty() {
            fallback_query
        } else {
            answer.query.as_str()
        };
        let context = serde_json::to_string(&answer.context).map_err(|e| ExportError::Save {
            file_name: "context".to_string(),
            reason: e.to_string(),
        })?;

        let form = Form::new()
            .text("query", query)
            .text("answer", answer.answer.as_str())
            .text("context", context);

        let bytes = self
            .transport
            .send(Endpoint::ExportJson, Some(form), ResponseKind::Binary)
            .await?
            .into_bytes()?;

        self.save(json_file_name(self.clock.now_millis()), bytes).await
    }

    async fn try_export_pdf(&self, content: &str, title: &str) -> Result<PathBuf, ExportError> {
        let form = Form::new().text("content", content).text("title", title);

        let bytes = self
            .transport
            .send(Endpoint::ExportPdf, Some(form), ResponseKind::Binary)
            .await?
            .into_bytes()?;

        self.save(pdf_file_name(title, self.clock.now_millis()), bytes).await
    }

    /// Hand the bytes to the sink on the blocking pool
    async fn save(&self, file_name: String, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        let sink = Arc::clone(&self.sink);
        let name = file_name.clone();

        tokio::task::spawn_blocking(move || sink.save(&name, &bytes))
            .await
            .map_err(|e| ExportError::Save {
                file_name,
                reason: e.to_string(),
            })?
    }

    fn report(
        &self,
        result: Result<PathBuf, ExportError>,
        format: &str,
    ) -> Result<PathBuf, ExportError> {
        if let Err(e) = &result {
            tracing::warn!("{} export failed: {}", format, e);
            self.notifier
                .alert(&format!("Error downloading {}: {}", format, e));
        }
        result
    }
}
