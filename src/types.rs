//! Crate-wide error type shared by every pipeline stage.

use thiserror::Error;

/// Errors surfaced by the ingestion pipeline and the query tool.
///
/// Each variant belongs to one stage boundary; stages capture their
/// collaborator's failure text at the point it crosses into the pipeline.
/// The ingestion flow converts any of these into a server-error response at
/// the top level, the query tool lets them reach the process boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FerryError {
    /// Object download failed: missing key, service error, or local write.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Document text extraction failed on unsupported or corrupt input.
    #[error("parse failed: {0}")]
    Parse(String),

    /// The external embedding call failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The vector store location is unreachable.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// Table open, create, upsert, or search failed.
    #[error("table operation failed: {0}")]
    Table(String),

    /// Invalid configuration, CLI input, event payload, or prompt file.
    #[error("invalid configuration: {0}")]
    Config(String),
}
