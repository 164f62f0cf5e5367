//! Command handlers for CLI operations
//!
//! One handler per one-shot command:
//! - upload: send a document for indexing
//! - ask: query the indexed documents, optionally saving the answer
//! - summarize: summarize every document, optionally saving a PDF
//! - export-pdf: render arbitrary text as a PDF
//! - config show: print the effective configuration
//!
//! Each handler prints its outcome in the requested [`OutputFormat`] and
//! returns the failure so the process exits non-zero.

use anyhow::Result;
use docsum_sdk::errors::{ClientError, ClientErrorExt};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::session::{OperationError, Session, SessionSnapshot};
use crate::view;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_failure(format: OutputFormat, error: &OperationError) -> Result<()> {
    let client_error = ClientError::from(error);
    match format {
        OutputFormat::Text => {
            println!("✗ {}", error);
            println!("  {}", client_error.user_hint());
        }
        OutputFormat::Json => print_json(&json!({
            "status": "failed",
            "error": error.to_string(),
            "hint": client_error.user_hint(),
            "recoverable": client_error.is_recoverable(),
        }))?,
    }
    Ok(())
}

fn print_saved(format: OutputFormat, what: &str, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => println!("✓ Saved {} to {}", what, path.display()),
        OutputFormat::Json => print_json(&json!({
            "status": "saved",
            "artifact": what,
            "path": path,
        }))?,
    }
    Ok(())
}

/// Run an export, reporting either outcome
async fn save_artifact(
    format: OutputFormat,
    what: &str,
    export: impl std::future::Future<Output = Result<PathBuf, OperationError>>,
) -> Result<()> {
    match export.await {
        Ok(path) => print_saved(format, what, &path),
        Err(e) => {
            print_failure(format, &e)?;
            Err(e.into())
        }
    }
}

/// Upload a document
pub async fn handle_upload(session: &Session, file: &Path, format: OutputFormat) -> Result<()> {
    if let Err(e) = session.select_file(file) {
        print_failure(format, &e)?;
        return Err(e.into());
    }

    let outcome = session.upload().await;
    let snapshot = session.snapshot();

    match format {
        OutputFormat::Text => print!("{}", view::render_upload(&snapshot)),
        OutputFormat::Json => print_json(&json!({
            "status": if outcome.is_ok() { "completed" } else { "failed" },
            "file": snapshot.selected_file,
            "upload_status": snapshot.upload_status,
        }))?,
    }

    outcome.map(|_| ()).map_err(Into::into)
}

/// Ask a question, then save the answer if requested
pub async fn handle_ask(
    session: &Session,
    query: String,
    save_json: bool,
    save_pdf: bool,
    format: OutputFormat,
) -> Result<()> {
    let outcome = session.ask(query).await;
    print_query(&session.snapshot(), format)?;
    outcome?;

    if save_json {
        save_artifact(format, "JSON", session.export_json()).await?;
    }
    if save_pdf {
        save_artifact(format, "PDF", session.export_answer_pdf()).await?;
    }
    Ok(())
}

fn print_query(snapshot: &SessionSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", view::render_query(snapshot)),
        OutputFormat::Json => print_json(&json!({
            "query": snapshot.query_text,
            "result": snapshot.query_result,
        }))?,
    }
    Ok(())
}

/// Summarize all documents, then save the summary if requested
pub async fn handle_summarize(session: &Session, save_pdf: bool, format: OutputFormat) -> Result<()> {
    let outcome = session.summarize().await;
    let snapshot = session.snapshot();

    match format {
        OutputFormat::Text => print!("{}", view::render_summary(&snapshot)),
        OutputFormat::Json => print_json(&json!({ "summary": snapshot.summary }))?,
    }
    outcome?;

    if save_pdf {
        save_artifact(format, "PDF", session.export_summary_pdf()).await?;
    }
    Ok(())
}

/// Render arbitrary text as a PDF
pub async fn handle_export_pdf(
    session: &Session,
    content: &str,
    title: &str,
    format: OutputFormat,
) -> Result<()> {
    save_artifact(format, "PDF", session.export_pdf(content, title)).await
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Docsum Configuration");
            println!("====================");
            println!();
            println!("  {:<22} {}", "Log level:", config.core.log_level);
            println!("  {:<22} {}", "Download directory:", config.core.download_dir.display());
            println!("  {:<22} {}", "API base URL:", config.api.base_url);
            println!(
                "  {:<22} {}",
                "Accepted types:",
                config.upload.accepted_extensions.join(", ")
            );
            println!("  {:<22} {} MB", "Max file size:", config.upload.max_file_size_mb);
        }
        OutputFormat::Json => print_json(&serde_json::to_value(config)?)?,
    }
    Ok(())
}
