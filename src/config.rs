//! Environment-driven configuration.
//!
//! Every knob is a `DOCFERRY_*` process variable with a default matching the
//! hosted deployment. Malformed numeric values are [`FerryError::Config`]
//! errors rather than silent fallbacks, so a typo in a deployment manifest
//! fails loudly instead of ingesting with surprise chunk sizes.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::chunk::ChunkerConfig;
use crate::embed::EmbeddingConfig;
use crate::types::FerryError;

/// Settings for the ingestion flow, read once at startup.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Region identifier handed to the object fetcher (`DOCFERRY_REGION`).
    pub region: String,
    /// Bucket component of the store location (`DOCFERRY_STORE_BUCKET`).
    pub store_bucket: String,
    /// Vector table rows are appended to (`DOCFERRY_TABLE`).
    pub table: String,
    /// Root directory store databases live under (`DOCFERRY_DATA_ROOT`).
    pub data_root: PathBuf,
    /// Directory downloaded objects land in (`DOCFERRY_SCRATCH_DIR`).
    pub scratch_dir: PathBuf,
    /// Chunk size and overlap (`DOCFERRY_CHUNK_SIZE`, `DOCFERRY_CHUNK_OVERLAP`).
    pub chunker: ChunkerConfig,
    /// Embedding endpoint settings, including the vector width.
    pub embedding: EmbeddingConfig,
}

impl IngestConfig {
    /// Reads the full ingestion configuration from the process environment.
    pub fn from_env() -> Result<Self, FerryError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, FerryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            region: text(&lookup, "DOCFERRY_REGION", "us-east-1"),
            store_bucket: text(&lookup, "DOCFERRY_STORE_BUCKET", "docferry-store"),
            table: text(&lookup, "DOCFERRY_TABLE", "embeddings-table"),
            data_root: PathBuf::from(text(&lookup, "DOCFERRY_DATA_ROOT", "/tmp")),
            scratch_dir: PathBuf::from(text(&lookup, "DOCFERRY_SCRATCH_DIR", "/tmp/documents")),
            chunker: ChunkerConfig {
                chunk_size: numeric(&lookup, "DOCFERRY_CHUNK_SIZE", 1000)?,
                chunk_overlap: numeric(&lookup, "DOCFERRY_CHUNK_OVERLAP", 200)?,
            },
            embedding: embedding_from_lookup(&lookup)?,
        })
    }
}

/// Settings for the query tool. Bucket, table, and region arrive on its
/// command line; only the data root and embedding endpoint come from the
/// environment.
#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub data_root: PathBuf,
    pub embedding: EmbeddingConfig,
}

impl QueryConfig {
    /// Reads the query-tool configuration from the process environment.
    pub fn from_env() -> Result<Self, FerryError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, FerryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            data_root: PathBuf::from(text(&lookup, "DOCFERRY_DATA_ROOT", "/tmp")),
            embedding: embedding_from_lookup(&lookup)?,
        })
    }
}

fn embedding_from_lookup<F>(lookup: &F) -> Result<EmbeddingConfig, FerryError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = EmbeddingConfig::default();
    Ok(EmbeddingConfig {
        base_url: lookup("DOCFERRY_EMBED_URL").unwrap_or(defaults.base_url),
        model: lookup("DOCFERRY_EMBED_MODEL").unwrap_or(defaults.model),
        width: numeric(lookup, "DOCFERRY_VECTOR_WIDTH", defaults.width)?,
        api_key: lookup("DOCFERRY_EMBED_API_KEY"),
        timeout_secs: numeric(lookup, "DOCFERRY_EMBED_TIMEOUT_SECS", defaults.timeout_secs)?,
    })
}

fn text<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn numeric<T, F>(lookup: &F, name: &str, default: T) -> Result<T, FerryError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| FerryError::Config(format!("{name} value '{raw}' is not valid: {err}"))),
        None => Ok(default),
    }
}
