//! CLI interface for docsum
//!
//! This module provides the command-line interface using clap's derive API.
//! Each subcommand maps onto one session operation; `shell` keeps a session
//! open for interactive use.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::session::SUMMARY_PDF_TITLE;

/// Docsum document assistant
///
/// Upload documents to a docsum server, ask questions about them, summarize
/// the whole collection, and save results as JSON or PDF.
#[derive(Parser, Debug)]
#[command(name = "docsum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a document and index it
    Upload {
        /// Document to upload (.pdf, .docx, .doc, .txt)
        file: PathBuf,
    },

    /// Ask a question about the uploaded documents
    Ask {
        /// The question
        query: String,

        /// Save the answer as a JSON file
        #[arg(long)]
        save_json: bool,

        /// Save the answer as a PDF file
        #[arg(long)]
        save_pdf: bool,
    },

    /// Summarize all uploaded documents
    Summarize {
        /// Save the summary as a PDF file
        #[arg(long)]
        save_pdf: bool,
    },

    /// Render arbitrary text as a PDF file
    ExportPdf {
        /// Text to render
        content: String,

        /// Document title, also used for the file name
        #[arg(short, long, default_value = SUMMARY_PDF_TITLE)]
        title: String,
    },

    /// Start an interactive session
    Shell,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["docsum", "shell"]);
        assert!(matches!(cli.command, Command::Shell));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["docsum", "--json", "--log", "debug", "summarize"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert!(matches!(cli.command, Command::Summarize { save_pdf: false }));
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::parse_from(["docsum", "ask", "capital of France?", "--save-json"]);
        if let Command::Ask {
            query,
            save_json,
            save_pdf,
        } = cli.command
        {
            assert_eq!(query, "capital of France?");
            assert!(save_json);
            assert!(!save_pdf);
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_upload_command() {
        let cli = Cli::parse_from(["docsum", "upload", "report.pdf"]);
        if let Command::Upload { file } = cli.command {
            assert_eq!(file, PathBuf::from("report.pdf"));
        } else {
            panic!("Expected Upload command");
        }
    }

    #[test]
    fn test_export_pdf_default_title() {
        let cli = Cli::parse_from(["docsum", "export-pdf", "some text"]);
        if let Command::ExportPdf { content, title } = cli.command {
            assert_eq!(content, "some text");
            assert_eq!(title, "Document Summary");
        } else {
            panic!("Expected ExportPdf command");
        }
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::parse_from(["docsum", "config", "show"]);
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
