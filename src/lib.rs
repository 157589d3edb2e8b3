//! docferry: upload-triggered document ingestion into a `sqlite-vec` vector
//! store, plus a one-off similarity query flow.
//!
//! The ingestion pipeline reacts to one upload notification at a time:
//!
//! ```text
//! UploadEvent ─► ObjectFetcher ─► scratch file
//!                                     │
//!                     DocumentParser ─► Document text
//!                                     │
//!                  CharacterChunker ─► overlapping chunks
//!                                     │
//!                   EmbeddingClient ─► one vector per chunk
//!                                     │
//!     SqliteVectorStore / VectorTable ─► rows appended, never rewritten
//! ```
//!
//! The query flow reads a prompt from a JSON file, embeds it with the same
//! client, and prints the nearest stored row.
//!
//! Two binaries drive the flows: `docferry-ingest` reads an
//! upload-notification document and reports a `{statusCode, body}` outcome;
//! `docferry-query` takes bucket, table, prompt file, and region on its
//! command line.
//!
//! Collaborators ([`fetch::ObjectFetcher`], [`parse::DocumentParser`],
//! [`embed::EmbeddingClient`]) are trait objects injected into
//! [`pipeline::IngestPipeline`], so tests swap in local stand-ins and never
//! touch a network.

pub mod chunk;
pub mod config;
pub mod embed;
pub mod event;
pub mod fetch;
pub mod parse;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod types;

pub use types::FerryError;
