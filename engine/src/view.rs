//! Presentation
//!
//! Pure functions from a [`SessionSnapshot`] to what the terminal shows.
//! [`Controls`] is the affordance contract: while an operation is in
//! flight, every gated control is disabled.

use docsum_sdk::types::QueryResult;
use std::fmt::Write;

use crate::session::{Activity, SessionSnapshot, StatusKind, Summary};

/// Which actions are currently available, and their labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub upload_enabled: bool,
    pub ask_enabled: bool,
    pub summarize_enabled: bool,
    pub export_answer_enabled: bool,
    pub export_summary_enabled: bool,
    pub upload_label: &'static str,
    pub ask_label: &'static str,
    pub summarize_label: &'static str,
}

impl Controls {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let activity = snapshot.activity;
        let idle = !activity.is_busy();
        let has_answer = snapshot
            .query_result
            .as_ref()
            .and_then(QueryResult::answer)
            .is_some();

        Self {
            upload_enabled: idle && snapshot.selected_file.is_some(),
            ask_enabled: idle && !snapshot.query_text.trim().is_empty(),
            summarize_enabled: idle,
            export_answer_enabled: has_answer,
            export_summary_enabled: matches!(&snapshot.summary, Summary::Ready(text) if !text.is_empty()),
            upload_label: if activity == Activity::Uploading {
                "Uploading..."
            } else {
                "Upload & Index"
            },
            ask_label: if activity == Activity::Querying {
                "Searching..."
            } else {
                "Ask"
            },
            summarize_label: if activity == Activity::Summarizing {
                "Generating..."
            } else {
                "Summarize All Documents"
            },
        }
    }
}

/// Render the upload card
pub fn render_upload(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let file_label = snapshot
        .selected_file
        .as_ref()
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "Choose file (PDF, Word, Text)".to_string());
    let _ = writeln!(out, "File: {}", file_label);

    if let Some(status) = &snapshot.upload_status {
        let tag = match status.kind {
            StatusKind::Success => "success",
            StatusKind::Pending => "pending",
            StatusKind::Error | StatusKind::Invalid => "error",
        };
        let _ = writeln!(out, "[{}] {}", tag, status);
    }
    out
}

/// Render the question/answer card
pub fn render_query(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();

    match &snapshot.query_result {
        None => {}
        Some(QueryResult::Failed { error }) => {
            let _ = writeln!(out, "Error: {}", error);
        }
        Some(QueryResult::Answered(answer)) => {
            let _ = writeln!(out, "Answer:");
            let _ = writeln!(out, "{}", answer.answer);

            if !answer.context.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "View source context ({} chunks)", answer.context.len());
                for (idx, chunk) in answer.context.iter().enumerate() {
                    match chunk.source_filename() {
                        Some(name) => {
                            let _ = writeln!(out, "  Chunk {} ({}):", idx + 1, name);
                        }
                        None => {
                            let _ = writeln!(out, "  Chunk {}:", idx + 1);
                        }
                    }
                    let _ = writeln!(out, "    {}", chunk.preview());
                }
            }
        }
    }
    out
}

/// Render the summary card
pub fn render_summary(snapshot: &SessionSnapshot) -> String {
    match &snapshot.summary {
        Summary::Empty => String::new(),
        summary => format!("Summary:\n{}\n", summary.text()),
    }
}

/// Render the whole session
pub fn render(snapshot: &SessionSnapshot) -> String {
    let controls = Controls::from_snapshot(snapshot);
    let mut out = String::new();

    let _ = writeln!(out, "== Upload Document ==");
    out.push_str(&render_upload(snapshot));

    let _ = writeln!(out, "\n== Ask Questions ==");
    if !snapshot.query_text.is_empty() {
        let _ = writeln!(out, "Query: {}", snapshot.query_text);
    }
    out.push_str(&render_query(snapshot));

    let _ = writeln!(out, "\n== Generate Summary ==");
    out.push_str(&render_summary(snapshot));

    if snapshot.activity != Activity::Idle {
        let _ = writeln!(out, "\n({} in progress)", snapshot.activity);
    }

    let _ = writeln!(out, "\nAvailable: {}", available_actions(&controls).join(", "));
    out
}

/// Names of the actions `controls` currently allows
pub fn available_actions(controls: &Controls) -> Vec<&'static str> {
    let mut actions = Vec::new();
    if controls.upload_enabled {
        actions.push("upload");
    }
    if controls.ask_enabled {
        actions.push("ask");
    }
    if controls.summarize_enabled {
        actions.push("summarize");
    }
    if controls.export_answer_enabled {
        actions.push("export json");
        actions.push("export pdf answer");
    }
    if controls.export_summary_enabled {
        actions.push("export pdf summary");
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SelectedFile, UploadStatus};
    use docsum_sdk::types::{ContextChunk, QueryAnswer};
    use std::path::PathBuf;

    fn answered() -> SessionSnapshot {
        SessionSnapshot {
            query_text: "capital of France?".to_string(),
            query_result: Some(QueryResult::Answered(QueryAnswer {
                answer: "Paris is the capital".to_string(),
                query: "capital of France?".to_string(),
                context: vec![ContextChunk::new("x".repeat(300))],
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_controls_disabled_while_busy() {
        let mut snapshot = answered();
        snapshot.selected_file = Some(SelectedFile {
            path: PathBuf::from("a.pdf"),
            name: "a.pdf".to_string(),
            size: 1,
        });
        snapshot.activity = Activity::Summarizing;

        let controls = Controls::from_snapshot(&snapshot);
        assert!(!controls.upload_enabled);
        assert!(!controls.ask_enabled);
        assert!(!controls.summarize_enabled);
        assert!(controls.export_answer_enabled);
        assert_eq!(controls.summarize_label, "Generating...");
        assert_eq!(controls.upload_label, "Upload & Index");
    }

    #[test]
    fn test_controls_when_idle() {
        let snapshot = SessionSnapshot::default();
        let controls = Controls::from_snapshot(&snapshot);

        assert!(!controls.upload_enabled);
        assert!(!controls.ask_enabled);
        assert!(controls.summarize_enabled);
        assert!(!controls.export_answer_enabled);
        assert!(!controls.export_summary_enabled);
        assert_eq!(controls.upload_label, "Upload & Index");
    }

    #[test]
    fn test_render_query_shows_chunk_preview() {
        let rendered = render_query(&answered());

        assert!(rendered.contains("Paris is the capital"));
        assert!(rendered.contains("View source context (1 chunks)"));
        assert!(rendered.contains(&format!("{}...", "x".repeat(200))));
        assert!(!rendered.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_render_upload_uses_status_kind() {
        let snapshot = SessionSnapshot {
            upload_status: Some(UploadStatus::error("bad file")),
            ..Default::default()
        };
        let rendered = render_upload(&snapshot);
        assert!(rendered.contains("[error] ✗ Error: bad file"));
    }

    #[test]
    fn test_render_failed_summary() {
        let snapshot = SessionSnapshot {
            summary: Summary::Failed("offline".to_string()),
            ..Default::default()
        };
        assert_eq!(render_summary(&snapshot), "Summary:\nError: offline\n");
    }
}
