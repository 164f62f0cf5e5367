//! Interaction State Machine
//!
//! A [`Session`] is the single source of truth for what the user has
//! selected and typed and for the last results. It exposes the user-initiated
//! operations and mediates them through the transport adapter:
//!
//! - **upload**: send the selected file, record an [`UploadStatus`]
//! - **query**: send the typed question, record a [`QueryResult`]
//! - **summarize**: ask for a whole-corpus [`Summary`]
//! - **export**: save the answer or summary as a JSON/PDF artifact
//!
//! # Mutual exclusion
//!
//! Upload, query and summarize share one [`Activity`] slot. Starting one
//! while another is in flight returns [`OperationError::Busy`] without
//! touching state or the network; nothing is queued. The slot is released
//! by a drop guard, so it returns to `Idle` on success, on failure, and
//! when the operation's future is dropped mid-flight.
//!
//! Exports do not take the slot and may run at any time.
//!
//! # Results
//!
//! Every operation both updates session state and returns a tagged
//! `Result`. Callers match on the tag; the state is what gets rendered.

use docsum_sdk::errors::ClientError;
use docsum_sdk::types::{QueryAnswer, QueryResult, SummaryResponse, UploadReceipt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{Config, UploadConfig};
use crate::exporter::{ArtifactExporter, DirectorySink, ExportError, Notifier, SystemClock};
use crate::transport::{
    Endpoint, Form, HttpTransport, ResponseKind, Transport, TransportError, TransportErrorKind,
};

pub mod state;

pub use state::{Activity, SelectedFile, SessionSnapshot, StatusKind, Summary, UploadStatus};

use state::SessionState;

/// Instruction sent with every summarize request
pub const SUMMARY_INSTRUCTION: &str = "Summarize the document";

/// Title of the PDF rendered from a query answer
pub const ANSWER_PDF_TITLE: &str = "Query Answer";

/// Title of the PDF rendered from the summary
pub const SUMMARY_PDF_TITLE: &str = "Document Summary";

/// Validation message when uploading without a file
pub const NO_FILE_MESSAGE: &str = "Please select a file";

/// Why an operation did not succeed
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Another operation is in progress ({0})")]
    Busy(Activity),

    #[error("{}", NO_FILE_MESSAGE)]
    NoFileSelected,

    #[error("Please enter a question")]
    EmptyQuery,

    #[error("There is no answer to export")]
    NoAnswer,

    #[error("There is no summary to export")]
    NoSummary,

    #[error("{0}")]
    File(String),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

impl OperationError {
    /// True for failures caught before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoFileSelected | Self::EmptyQuery | Self::NoAnswer | Self::NoSummary
        )
    }
}

impl From<&OperationError> for ClientError {
    fn from(error: &OperationError) -> Self {
        let message = error.to_string();
        match error {
            OperationError::Transport(e) | OperationError::Export(ExportError::Transport(e)) => {
                match e.kind {
                    TransportErrorKind::Server { .. } => ClientError::Server(message),
                    TransportErrorKind::Network | TransportErrorKind::Decode => {
                        ClientError::Network(message)
                    }
                }
            }
            OperationError::Export(ExportError::Save { .. }) => ClientError::Export(message),
            OperationError::Busy(_)
            | OperationError::NoFileSelected
            | OperationError::EmptyQuery
            | OperationError::NoAnswer
            | OperationError::NoSummary
            | OperationError::File(_) => ClientError::InvalidInput(message),
        }
    }
}

/// Holds the activity slot; frees it on drop
struct ActivityGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!("Activity {} finished", state.activity);
        state.activity = Activity::Idle;
    }
}

/// Client session against one document server
pub struct Session {
    transport: Arc<dyn Transport>,
    exporter: ArtifactExporter,
    upload_rules: UploadConfig,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session from its collaborators
    pub fn new(
        transport: Arc<dyn Transport>,
        exporter: ArtifactExporter,
        upload_rules: UploadConfig,
    ) -> Self {
        Self {
            transport,
            exporter,
            upload_rules,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Wire a session to the configured server and download directory
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self, ClientError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api.base_url)?);
        let exporter = ArtifactExporter::new(
            Arc::clone(&transport),
            Arc::new(DirectorySink::new(&config.core.download_dir)),
            Arc::new(SystemClock),
            notifier,
        );

        Ok(Self::new(transport, exporter, config.upload.clone()))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the activity slot for `activity`
    ///
    /// `prepare` runs under the same lock, only when the session is idle.
    /// If it fails the slot is left untouched.
    fn begin<T>(
        &self,
        activity: Activity,
        prepare: impl FnOnce(&mut SessionState) -> Result<T, OperationError>,
    ) -> Result<(ActivityGuard<'_>, T), OperationError> {
        let mut state = self.state();

        if state.activity.is_busy() {
            tracing::debug!("Rejected {}: session is {}", activity, state.activity);
            return Err(OperationError::Busy(state.activity));
        }

        let prepared = prepare(&mut *state)?;
        state.activity = activity;
        tracing::debug!("Activity {} started", activity);

        Ok((ActivityGuard { state: &self.state }, prepared))
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    pub fn activity(&self) -> Activity {
        self.state().activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity().is_busy()
    }

    pub fn upload_rules(&self) -> &UploadConfig {
        &self.upload_rules
    }

    /// Pick the file the next upload will send
    ///
    /// Clears the previous upload status.
    pub fn select_file(&self, path: impl AsRef<Path>) -> Result<SelectedFile, OperationError> {
        let path = path.as_ref();
        let file = SelectedFile::from_path(path)
            .map_err(|e| OperationError::File(format!("Cannot open {}: {}", path.display(), e)))?;

        for warning in file.advisories(&self.upload_rules) {
            tracing::warn!("{}", warning);
        }

        let mut state = self.state();
        state.selected_file = Some(file.clone());
        state.upload_status = None;
        Ok(file)
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.state().selected_file.clone()
    }

    /// Replace the query text
    pub fn set_query_text(&self, text: impl Into<String>) {
        self.state().query_text = text.into();
    }

    pub fn clear_query_text(&self) {
        self.state().query_text.clear();
    }

    pub fn query_text(&self) -> String {
        self.state().query_text.clone()
    }

    pub fn upload_status(&self) -> Option<UploadStatus> {
        self.state().upload_status.clone()
    }

    pub fn query_result(&self) -> Option<QueryResult> {
        self.state().query_result.clone()
    }

    pub fn summary(&self) -> Summary {
        self.state().summary.clone()
    }

    /// Upload the selected file to the server for indexing
    pub async fn upload(&self) -> Result<UploadReceipt, OperationError> {
        let (_guard, file) = self.begin(Activity::Uploading, |state| {
            let Some(file) = state.selected_file.clone() else {
                state.upload_status = Some(UploadStatus::invalid(NO_FILE_MESSAGE));
                return Err(OperationError::NoFileSelected);
            };
            state.upload_status = Some(UploadStatus::pending());
            Ok(file)
        })?;

        tracing::info!("Uploading {} ({} bytes)", file.name, file.size);

        let outcome = self.send_upload(&file).await;

        let mut state = self.state();
        state.upload_status = Some(match &outcome {
            Ok(receipt) => UploadStatus::success(&receipt.message),
            Err(e) => UploadStatus::error(e),
        });
        outcome
    }

    async fn send_upload(&self, file: &SelectedFile) -> Result<UploadReceipt, OperationError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| OperationError::File(format!("Cannot read {}: {}", file.name, e)))?;

        for warning in file.advisories(&self.upload_rules) {
            tracing::warn!("Sending anyway: {}", warning);
        }

        let form = Form::new().file("file", file.name.as_str(), bytes);
        let receipt = self
            .transport
            .send(Endpoint::Upload, Some(form), ResponseKind::Json)
            .await?
            .into_json::<UploadReceipt>()?;

        Ok(receipt)
    }

    /// Ask the current query text against the indexed documents
    ///
    /// Blank query text is rejected without a request and leaves the
    /// previous result in place.
    pub async fn query(&self) -> Result<QueryAnswer, OperationError> {
        self.run_query(None).await
    }

    /// Replace the query text with `text` and ask it
    ///
    /// The text is only stored once the activity slot is claimed, so a
    /// refused call leaves the current query text alone.
    pub async fn ask(&self, text: impl Into<String>) -> Result<QueryAnswer, OperationError> {
        self.run_query(Some(text.into())).await
    }

    async fn run_query(&self, text: Option<String>) -> Result<QueryAnswer, OperationError> {
        let (_guard, text) = self.begin(Activity::Querying, |state| {
            if let Some(text) = text {
                state.query_text = text;
            }
            if state.query_text.trim().is_empty() {
                return Err(OperationError::EmptyQuery);
            }
            state.query_result = None;
            Ok(state.query_text.clone())
        })?;

        tracing::info!("Querying: {}", text);

        let outcome = self
            .transport
            .send(
                Endpoint::Query,
                Some(Form::new().text("query", text)),
                ResponseKind::Json,
            )
            .await
            .and_then(|response| response.into_json::<QueryAnswer>());

        let mut state = self.state();
        match outcome {
            Ok(answer) => {
                tracing::info!("Answer received with {} context chunk(s)", answer.context.len());
                state.query_result = Some(QueryResult::Answered(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                state.query_result = Some(QueryResult::Failed {
                    error: e.message.clone(),
                });
                Err(e.into())
            }
        }
    }

    /// Request a summary of every indexed document
    pub async fn summarize(&self) -> Result<String, OperationError> {
        let (_guard, ()) = self.begin(Activity::Summarizing, |state| {
            state.summary = Summary::Empty;
            Ok(())
        })?;

        tracing::info!("Requesting corpus summary");

        let outcome = self
            .transport
            .send(
                Endpoint::Summarize,
                Some(Form::new().text("query", SUMMARY_INSTRUCTION)),
                ResponseKind::Json,
            )
            .await
            .and_then(|response| response.into_json::<SummaryResponse>());

        let mut state = self.state();
        match outcome {
            Ok(response) => {
                state.summary = Summary::Ready(response.summary.clone());
                Ok(response.summary)
            }
            Err(e) => {
                state.summary = Summary::Failed(e.message.clone());
                Err(e.into())
            }
        }
    }

    /// Save the current answer as a JSON artifact
    ///
    /// No-op unless the last query produced an answer.
    pub async fn export_json(&self) -> Result<PathBuf, OperationError> {
        let (answer, query_text) = {
            let state = self.state();
            let answer = state
                .query_result
                .as_ref()
                .and_then(QueryResult::answer)
                .cloned()
                .ok_or(OperationError::NoAnswer)?;
            (answer, state.query_text.clone())
        };

        Ok(self.exporter.export_json(&answer, &query_text).await?)
    }

    /// Save arbitrary text as a PDF artifact titled `title`
    pub async fn export_pdf(&self, content: &str, title: &str) -> Result<PathBuf, OperationError> {
        Ok(self.exporter.export_pdf(content, title).await?)
    }

    /// Save the current answer as a PDF artifact
    pub async fn export_answer_pdf(&self) -> Result<PathBuf, OperationError> {
        let answer = self
            .query_result()
            .as_ref()
            .and_then(QueryResult::answer)
            .map(|a| a.answer.clone())
            .ok_or(OperationError::NoAnswer)?;

        self.export_pdf(&answer, ANSWER_PDF_TITLE).await
    }

    /// Save the current summary as a PDF artifact
    pub async fn export_summary_pdf(&self) -> Result<PathBuf, OperationError> {
        let summary = match self.summary() {
            Summary::Ready(text) if !text.is_empty() => text,
            _ => return Err(OperationError::NoSummary),
        };

        self.export_pdf(&summary, SUMMARY_PDF_TITLE).await
    }
}
