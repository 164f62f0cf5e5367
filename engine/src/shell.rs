//! Interactive shell
//!
//! Keeps one [`Session`] alive across commands. Upload, ask and summarize run
//! in the background so the prompt stays responsive; while one of them is in
//! flight the others are refused, exactly like disabled buttons. Exports run
//! in the background too and are never refused.

use anyhow::Result;
use docsum_sdk::types::QueryAnswer;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

use crate::session::{OperationError, Session};
use crate::view::{self, Controls};

const HELP: &str = "\
Commands:
  file <PATH>          select the document to upload
  upload               upload and index the selected document
  ask [QUESTION]       ask a question (uses the current query if omitted)
  query <TEXT>         set the query text without asking
  clear                clear the query text
  summarize            summarize all uploaded documents
  export json          save the current answer as JSON
  export pdf answer    save the current answer as PDF
  export pdf summary   save the current summary as PDF
  show                 show the whole session
  help                 show this help
  quit                 leave the shell";

/// Which text a PDF export renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfSource {
    Answer,
    Summary,
}

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    File(PathBuf),
    Upload,
    Ask(Option<String>),
    Query(String),
    Clear,
    Summarize,
    ExportJson,
    ExportPdf(PdfSource),
    Show,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "file" | "select" if rest.is_empty() => return Err("Usage: file <PATH>".to_string()),
        "file" | "select" => ShellCommand::File(PathBuf::from(rest)),
        "upload" => ShellCommand::Upload,
        "ask" if rest.is_empty() => ShellCommand::Ask(None),
        "ask" => ShellCommand::Ask(Some(rest.to_string())),
        "query" => ShellCommand::Query(rest.to_string()),
        "clear" => ShellCommand::Clear,
        "summarize" | "summary" => ShellCommand::Summarize,
        "export" => parse_export(rest)?,
        "show" | "status" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(Some(command))
}

fn parse_export(args: &str) -> Result<ShellCommand, String> {
    let words: Vec<String> = args.split_whitespace().map(str::to_lowercase).collect();
    match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["json"] => Ok(ShellCommand::ExportJson),
        ["pdf"] | ["pdf", "answer"] => Ok(ShellCommand::ExportPdf(PdfSource::Answer)),
        ["pdf", "summary"] => Ok(ShellCommand::ExportPdf(PdfSource::Summary)),
        _ => Err("Usage: export json | export pdf [answer|summary]".to_string()),
    }
}

/// Destination for everything the shell prints
pub type Output = Arc<Mutex<dyn Write + Send>>;

fn emit(output: &Output, text: &str) {
    let mut out = output.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        tracing::debug!("Shell output failed: {}", e);
    }
}

/// Interactive loop over one session
pub struct Shell {
    session: Arc<Session>,
    tasks: JoinSet<()>,
    output: Output,
}

impl Shell {
    /// Shell printing to stdout
    pub fn new(session: Arc<Session>) -> Self {
        Self::with_output(session, Arc::new(Mutex::new(std::io::stdout())))
    }

    pub fn with_output(session: Arc<Session>, output: Output) -> Self {
        Self {
            session,
            tasks: JoinSet::new(),
            output,
        }
    }

    fn say(&self, text: &str) {
        emit(&self.output, text);
    }

    /// Read commands from `input` until `quit` or end of input
    ///
    /// Operations still in flight are awaited before returning.
    pub async fn run<R>(mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.say("docsum shell. Type 'help' for commands.\n");

        loop {
            self.reap();
            self.say("docsum> ");

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_command(&line) {
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => self.dispatch(command),
                Ok(None) => {}
                Err(message) => self.say(&format!("{}\n", message)),
            }
        }

        if !self.tasks.is_empty() {
            self.say(&format!(
                "Waiting for {} to finish...\n",
                self.session.activity()
            ));
        }
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Shell task failed: {}", e);
            }
        }
        Ok(())
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!("Shell task failed: {}", e);
            }
        }
    }

    fn dispatch(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::File(path) => self.select(&path),
            ShellCommand::Query(text) => self.session.set_query_text(text),
            ShellCommand::Clear => self.session.clear_query_text(),
            ShellCommand::Show => self.say(&view::render(&self.session.snapshot())),
            ShellCommand::Help => self.say(&format!("{}\n", HELP)),
            ShellCommand::Quit => {}

            ShellCommand::Upload => self.spawn_gated(|session, output| async move {
                let text = match session.upload().await {
                    Err(e @ OperationError::Busy(_)) => format!("\n✗ {}\n", e),
                    _ => format!("\n{}", view::render_upload(&session.snapshot())),
                };
                emit(&output, &text);
            }),
            // The text travels with the task and is stored only once the slot is claimed
            ShellCommand::Ask(Some(text)) => self.spawn_gated(|session, output| async move {
                let outcome = session.ask(text).await;
                emit(&output, &query_outcome(&session, outcome));
            }),
            ShellCommand::Ask(None) => self.spawn_gated(|session, output| async move {
                let outcome = session.query().await;
                emit(&output, &query_outcome(&session, outcome));
            }),
            ShellCommand::Summarize => self.spawn_gated(|session, output| async move {
                let text = match session.summarize().await {
                    Err(e @ OperationError::Busy(_)) => format!("\n✗ {}\n", e),
                    _ => format!("\n{}", view::render_summary(&session.snapshot())),
                };
                emit(&output, &text);
            }),

            ShellCommand::ExportJson => {
                self.spawn_export(|session| async move { session.export_json().await })
            }
            ShellCommand::ExportPdf(PdfSource::Answer) => {
                self.spawn_export(|session| async move { session.export_answer_pdf().await })
            }
            ShellCommand::ExportPdf(PdfSource::Summary) => {
                self.spawn_export(|session| async move { session.export_summary_pdf().await })
            }
        }
    }

    fn select(&self, path: &std::path::Path) {
        match self.session.select_file(path) {
            Ok(file) => {
                let mut text = format!("Selected {} ({} bytes)\n", file.name, file.size);
                for warning in file.advisories(self.session.upload_rules()) {
                    text.push_str(&format!("  warning: {}\n", warning));
                }
                self.say(&text);
            }
            Err(e) => self.say(&format!("✗ {}\n", e)),
        }
    }

    fn refuse(&self) {
        let controls = Controls::from_snapshot(&self.session.snapshot());
        self.say(&format!(
            "✗ {} Available: {}\n",
            OperationError::Busy(self.session.activity()),
            view::available_actions(&controls).join(", ")
        ));
    }

    /// Start a gated operation unless one is already in flight
    fn spawn_gated<F, Fut>(&mut self, operation: F)
    where
        F: FnOnce(Arc<Session>, Output) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.session.is_busy() {
            self.refuse();
            return;
        }
        self.tasks.spawn(operation(
            Arc::clone(&self.session),
            Arc::clone(&self.output),
        ));
    }

    fn spawn_export<F, Fut>(&mut self, export: F)
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<PathBuf, OperationError>> + Send + 'static,
    {
        let pending = export(Arc::clone(&self.session));
        let output = Arc::clone(&self.output);
        self.tasks.spawn(async move {
            match pending.await {
                Ok(path) => emit(&output, &format!("\n✓ Saved {}\n", path.display())),
                // Transport and save failures were already alerted
                Err(OperationError::Export(_)) => {}
                Err(e) => emit(&output, &format!("\n✗ {}\n", e)),
            }
        });
    }
}

/// Text shown when a query task settles
fn query_outcome(session: &Session, outcome: Result<QueryAnswer, OperationError>) -> String {
    match outcome {
        Err(e) if e.is_validation() || matches!(e, OperationError::Busy(_)) => {
            format!("\n✗ {}\n", e)
        }
        _ => format!("\n{}", view::render_query(&session.snapshot())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_ask() {
        assert_eq!(parse_command("ask"), Ok(Some(ShellCommand::Ask(None))));
        assert_eq!(
            parse_command("ask  What is the capital of France? "),
            Ok(Some(ShellCommand::Ask(Some(
                "What is the capital of France?".to_string()
            ))))
        );
    }

    #[test]
    fn test_parse_file_requires_path() {
        assert!(parse_command("file").is_err());
        assert_eq!(
            parse_command("file docs/report final.pdf"),
            Ok(Some(ShellCommand::File(PathBuf::from("docs/report final.pdf"))))
        );
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(parse_command("export json"), Ok(Some(ShellCommand::ExportJson)));
        assert_eq!(
            parse_command("export pdf"),
            Ok(Some(ShellCommand::ExportPdf(PdfSource::Answer)))
        );
        assert_eq!(
            parse_command("EXPORT PDF SUMMARY"),
            Ok(Some(ShellCommand::ExportPdf(PdfSource::Summary)))
        );
        assert!(parse_command("export csv").is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_command("dance").unwrap_err();
        assert!(err.contains("Unknown command 'dance'"));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_command("exit"), Ok(Some(ShellCommand::Quit)));
        assert_eq!(parse_command("summary"), Ok(Some(ShellCommand::Summarize)));
        assert_eq!(parse_command("?"), Ok(Some(ShellCommand::Help)));
    }
}
