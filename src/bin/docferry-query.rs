//! One-off similarity query against an ingested vector table.
//!
//! Prints the nearest stored row (text, metadata, distance) for the prompt
//! in the given JSON file.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use docferry::config::QueryConfig;
use docferry::embed::HttpEmbeddingClient;
use docferry::query::{load_prompt, run_query};
use docferry::store::StoreLocation;
use docferry::types::FerryError;

/// Print the nearest stored rows for a prompt.
#[derive(Debug, Parser)]
#[command(name = "docferry-query", version, about)]
struct Args {
    /// Storage bucket whose store holds the table.
    bucket: String,
    /// Vector table to search.
    table: String,
    /// Path to a JSON file shaped {"prompt": "..."}.
    prompt_file: PathBuf,
    /// Region identifier, logged alongside the other inputs; the store on
    /// local disk needs no remote region.
    region: String,
}

#[tokio::main]
async fn main() -> Result<(), FerryError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!(
        bucket = %args.bucket,
        table = %args.table,
        prompt_file = %args.prompt_file.display(),
        region = %args.region,
        "query inputs"
    );

    let config = QueryConfig::from_env()?;
    let prompt = load_prompt(&args.prompt_file).await?;
    let embedder = HttpEmbeddingClient::new(config.embedding)?;
    let location = StoreLocation::new(config.data_root, &args.bucket);

    let hits = run_query(&embedder, &location, &args.table, &prompt, 1).await?;
    for hit in &hits {
        println!("text: {}", hit.text);
        println!("metadata: {}", hit.metadata_json());
        println!("distance: {}", hit.distance);
    }
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
