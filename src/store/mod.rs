//! Vector-store gateway.
//!
//! All persistence flows through this module: connecting to the database
//! behind a [`StoreLocation`], opening or creating a named table, appending
//! rows, and nearest-neighbor search. Nothing outside `store/` issues SQL.
//!
//! A store is one SQLite database per bucket at
//! `<data_root>/<bucket>/embeddings.db`. Each logical table is a plain rows
//! table plus a `vec0` companion (`<name>_vectors`) joined by rowid; see
//! [`sqlite::SqliteVectorStore`].

pub mod sqlite;

pub use sqlite::{SqliteVectorStore, VectorTable};

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Text of the row seeded into a freshly created table.
///
/// Creating a table writes one placeholder row so the schema and the vec0
/// companion exist before the first real upsert. It is never removed and is
/// visible to searches like any other row.
pub const PLACEHOLDER_TEXT: &str = "sample";

/// Addressing for one store: a data root plus the bucket the ingested
/// documents belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLocation {
    data_root: PathBuf,
    bucket: String,
}

impl StoreLocation {
    pub fn new(data_root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Path of the backing database file, `<data_root>/<bucket>/embeddings.db`.
    pub fn database_path(&self) -> PathBuf {
        self.data_root.join(&self.bucket).join("embeddings.db")
    }
}

/// One (text, vector) pair to persist.
///
/// Rows are appended, never rewritten: upserting the same rows twice leaves
/// both copies in the table.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorRow {
    pub text: String,
    pub vector: Vec<f32>,
}

impl VectorRow {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
        }
    }
}

/// One similarity-search result.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub text: String,
    /// Always empty in this pipeline; kept so callers see the stored shape.
    pub metadata: Map<String, Value>,
    /// L2 distance to the query vector; hits arrive nearest first.
    pub distance: f32,
}

impl SearchHit {
    /// The stored metadata as a JSON value, handy for display.
    pub fn metadata_json(&self) -> Value {
        Value::Object(self.metadata.clone())
    }
}
