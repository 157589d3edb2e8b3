//! One-off similarity queries against an ingested table.

use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::embed::EmbeddingClient;
use crate::store::{PLACEHOLDER_TEXT, SearchHit, SqliteVectorStore, StoreLocation};
use crate::types::FerryError;

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompt: String,
}

/// Reads the query prompt from a JSON file shaped `{"prompt": "..."}`.
///
/// A missing file, malformed JSON, or an absent `prompt` field is a
/// [`FerryError::Config`].
pub async fn load_prompt(path: &Path) -> Result<String, FerryError> {
    let raw = fs::read_to_string(path).await.map_err(|err| {
        FerryError::Config(format!("prompt file '{}' is unreadable: {err}", path.display()))
    })?;
    let file: PromptFile = serde_json::from_str(&raw).map_err(|err| {
        FerryError::Config(format!("prompt file '{}' is not valid: {err}", path.display()))
    })?;
    Ok(file.prompt)
}

/// Embeds `prompt` and returns the `k` nearest stored rows, nearest first.
///
/// Opening the table goes through the same create-on-miss path as ingestion,
/// so querying a table nobody has written yet yields the placeholder row
/// rather than an error.
pub async fn run_query(
    embedder: &dyn EmbeddingClient,
    location: &StoreLocation,
    table_name: &str,
    prompt: &str,
    k: usize,
) -> Result<Vec<SearchHit>, FerryError> {
    let vectors = embedder.embed(&[prompt.to_string()]).await?;
    let query_vector = vectors.into_iter().next().ok_or_else(|| {
        FerryError::Embedding("embedding service returned no vector for the prompt".to_string())
    })?;

    let store = SqliteVectorStore::connect(location).await?;
    let table = store
        .open_or_create_table(table_name, embedder.width())
        .await?;
    let hits = table.similarity_search(&query_vector, k).await?;

    info!(table = table_name, hits = hits.len(), "similarity search finished");
    if hits.first().is_some_and(|hit| hit.text == PLACEHOLDER_TEXT) {
        warn!(
            table = table_name,
            "nearest match is the seeded placeholder row; the table may hold no ingested rows"
        );
    }
    Ok(hits)
}
