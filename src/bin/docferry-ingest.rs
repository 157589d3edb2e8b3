//! Ingestion entry point: read an upload-notification JSON document, run the
//! pipeline, print the flow response.
//!
//! The response is the only stdout output and the process exits 0 whether
//! ingestion succeeded or not; the `statusCode` field carries the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use docferry::chunk::CharacterChunker;
use docferry::config::IngestConfig;
use docferry::embed::HttpEmbeddingClient;
use docferry::event::UploadEvent;
use docferry::fetch::S3ObjectFetcher;
use docferry::parse::PdfParser;
use docferry::pipeline::{FlowResponse, IngestPipeline};
use docferry::store::StoreLocation;
use docferry::types::FerryError;

/// Ingest one uploaded document into the vector store.
#[derive(Debug, Parser)]
#[command(name = "docferry-ingest", version, about)]
struct Args {
    /// Path to the upload-notification JSON; '-' or omitted reads stdin.
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let response = match run(args).await {
        Ok(response) => response,
        Err(err) => FlowResponse::failure(err.to_string()),
    };
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to encode flow response: {err}"),
    }
}

async fn run(args: Args) -> Result<FlowResponse, FerryError> {
    let config = IngestConfig::from_env()?;
    let payload = read_event_payload(args.event.as_deref()).await?;
    let event = UploadEvent::from_json(&payload)?;

    let pipeline = IngestPipeline::new(
        Arc::new(S3ObjectFetcher::new(&config.region)),
        Arc::new(PdfParser::new()),
        CharacterChunker::new(config.chunker)?,
        Arc::new(HttpEmbeddingClient::new(config.embedding.clone())?),
        StoreLocation::new(&config.data_root, &config.store_bucket),
        &config.table,
        &config.scratch_dir,
    );
    Ok(pipeline.handle(&event).await)
}

async fn read_event_payload(path: Option<&Path>) -> Result<String, FerryError> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            tokio::fs::read_to_string(path).await.map_err(|err| {
                FerryError::Config(format!("event file '{}' is unreadable: {err}", path.display()))
            })
        }
        _ => {
            let mut payload = String::new();
            tokio::io::stdin()
                .read_to_string(&mut payload)
                .await
                .map_err(|err| FerryError::Config(format!("reading event from stdin: {err}")))?;
            Ok(payload)
        }
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
