use anyhow::Result;
use clap::Parser;

use docqa_core::config::Config;
use docqa_service::serve;
use docqa_service::telemetry::init_tracing;

/// HTTP server for document embedding, summaries and Q&A.
#[derive(Debug, Parser)]
#[command(name = "docqa-server", version)]
struct Args {
    /// Overrides `server.host`
    #[arg(long, env = "DOCQA_HOST")]
    host: Option<String>,
    /// Overrides `server.port`
    #[arg(long, env = "DOCQA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = Config::load()?.settings()?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    init_tracing(&settings.logging);
    tracing::info!(
        upload_dir = %settings.storage.upload_dir.display(),
        index_dir = %settings.storage.index_dir.display(),
        "starting docqa server"
    );
    serve(settings).await
}
