use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docqa_core::config::Config;
use docqa_service::responses::ErrorResponse;
use docqa_service::telemetry::init_tracing;
use docqa_service::{DocQa, DocumentSource};

/// Ask questions about a PDF or text document.
#[derive(Debug, Parser)]
#[command(name = "docqa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a document, replacing whatever was indexed before
    Embed(DocumentArgs),
    /// Summarize a document
    Summarize(DocumentArgs),
    /// Answer a question from the indexed document
    Ask { question: String },
    /// Generate a practice question about a document
    Questions(DocumentArgs),
    /// Check whether an answer is backed by the indexed document
    Evaluate { answer: String },
    /// List documents in the upload directory
    Documents,
}

#[derive(Debug, clap::Args)]
struct DocumentArgs {
    /// Path to a .pdf or .txt file, or an upload name with --existing
    file: PathBuf,
    /// Reuse a document already in the upload directory
    #[arg(long)]
    existing: bool,
}

impl DocumentArgs {
    fn source(&self) -> Result<DocumentSource> {
        if self.existing {
            return Ok(DocumentSource::Existing(self.file.to_string_lossy().into_owned()));
        }
        let bytes = std::fs::read(&self.file).with_context(|| format!("reading {}", self.file.display()))?;
        Ok(DocumentSource::Upload { file_name: file_name(&self.file)?, bytes })
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

async fn run(app: &DocQa, command: Command) -> Result<()> {
    match command {
        Command::Embed(args) => {
            let pb = spinner(&format!("Embedding {}", args.file.display()))?;
            let result = app.embed(args.source()?).await;
            pb.finish_and_clear();
            print_json(&result?)
        }
        Command::Summarize(args) => print_json(&app.summarize(args.source()?).await?),
        Command::Ask { question } => print_json(&app.ask(&question).await?),
        Command::Questions(args) => print_json(&app.generate_questions(args.source()?).await?),
        Command::Evaluate { answer } => print_json(&app.evaluate(&answer).await?),
        Command::Documents => print_json(&app.list_documents()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;
    init_tracing(&settings.logging);

    let app = DocQa::from_settings(settings)?;
    if let Err(err) = run(&app, cli.command).await {
        tracing::debug!(error = ?err, "command failed");
        let body = ErrorResponse { error: format!("{err:#}"), traceback: format!("{err:?}") };
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        std::process::exit(1);
    }
    Ok(())
}
