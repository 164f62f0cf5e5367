// Docsum document assistant
// Main entry point for the docsum binary

use clap::Parser;
use docsum_engine::cli::{Cli, Command, ConfigAction};
use docsum_engine::config::Config;
use docsum_engine::exporter::StderrNotifier;
use docsum_engine::handlers::{
    handle_ask, handle_config_show, handle_export_pdf, handle_summarize, handle_upload,
    OutputFormat,
};
use docsum_engine::session::Session;
use docsum_engine::shell::Shell;
use docsum_engine::telemetry::init_telemetry_with_level;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let log_level = config.log_level(cli.log.as_deref())?;
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Docsum v{} ({} - {})", version, commit, timestamp);
    tracing::debug!("Server: {}", config.api.base_url);

    let format = OutputFormat::from_flag(cli.json);

    match cli.command {
        Command::Config { action } => {
            tracing::info!("Config management: {:?}", action);
            match action {
                ConfigAction::Show => handle_config_show(&config, format),
            }
        }
        command => run(command, &config, format).await,
    }
}

/// Commands that talk to the document server
async fn run(command: Command, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let session = Session::from_config(config, Arc::new(StderrNotifier))?;

    match command {
        Command::Upload { file } => {
            tracing::info!("Uploading {}", file.display());
            handle_upload(&session, &file, format).await
        }

        Command::Ask {
            query,
            save_json,
            save_pdf,
        } => handle_ask(&session, query, save_json, save_pdf, format).await,

        Command::Summarize { save_pdf } => handle_summarize(&session, save_pdf, format).await,

        Command::ExportPdf { content, title } => {
            handle_export_pdf(&session, &content, &title, format).await
        }

        Command::Shell => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            Shell::new(Arc::new(session)).run(input).await
        }

        Command::Config { .. } => unreachable!("handled before a session is created"),
    }
}
