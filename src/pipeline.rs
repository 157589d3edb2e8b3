//! The ingestion pipeline: fetch, parse, chunk, embed, upsert.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunk::CharacterChunker;
use crate::embed::EmbeddingClient;
use crate::event::UploadEvent;
use crate::fetch::ObjectFetcher;
use crate::parse::DocumentParser;
use crate::store::{SqliteVectorStore, StoreLocation, VectorRow};
use crate::types::FerryError;

/// Structured outcome reported to whatever invoked the ingestion flow.
///
/// Serializes as `{"statusCode": ..., "body": {"message": ...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub message: String,
}

impl FlowResponse {
    /// The `201 {"message": "OK"}` response for a completed ingestion.
    pub fn success() -> Self {
        Self {
            status_code: 201,
            body: ResponseBody {
                message: "OK".to_string(),
            },
        }
    }

    /// The `500` response carrying the failure detail.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: ResponseBody {
                message: message.into(),
            },
        }
    }
}

/// What one successful run produced.
#[derive(Clone, Debug)]
struct IngestReport {
    key: String,
    chunks: usize,
    rows_upserted: usize,
    table_rows: usize,
}

/// Orchestrates one ingestion run per upload notification.
///
/// Collaborators are injected at construction and the pipeline owns no
/// global state, so one instance can serve many events. Stages run strictly
/// in sequence and the first failure aborts the run; rows committed by an
/// earlier invocation are never rolled back.
pub struct IngestPipeline {
    fetcher: Arc<dyn ObjectFetcher>,
    parser: Arc<dyn DocumentParser>,
    chunker: CharacterChunker,
    embedder: Arc<dyn EmbeddingClient>,
    location: StoreLocation,
    table_name: String,
    scratch_dir: PathBuf,
}

impl IngestPipeline {
    pub fn new(
        fetcher: Arc<dyn ObjectFetcher>,
        parser: Arc<dyn DocumentParser>,
        chunker: CharacterChunker,
        embedder: Arc<dyn EmbeddingClient>,
        location: StoreLocation,
        table_name: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            chunker,
            embedder,
            location,
            table_name: table_name.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Runs the pipeline for one event and converts the outcome at the flow
    /// boundary: `201` with `"OK"` on success, `500` with the error text on
    /// the first failed stage. This never returns an error.
    pub async fn handle(&self, event: &UploadEvent) -> FlowResponse {
        match self.run(event).await {
            Ok(report) => {
                info!(
                    key = %report.key,
                    chunks = report.chunks,
                    rows = report.rows_upserted,
                    table_rows = report.table_rows,
                    "ingestion complete"
                );
                FlowResponse::success()
            }
            Err(err) => {
                error!(error = %err, "ingestion failed");
                FlowResponse::failure(err.to_string())
            }
        }
    }

    async fn run(&self, event: &UploadEvent) -> Result<IngestReport, FerryError> {
        let record = event.first_record()?;
        let bucket = record.bucket();
        let key = record.decoded_key()?;

        let file_name = Path::new(&key)
            .file_name()
            .ok_or_else(|| FerryError::Config(format!("object key '{key}' has no file name")))?;
        let dest = self.scratch_dir.join(file_name);

        let bytes = self.fetcher.fetch(bucket, &key, &dest).await?;
        info!(bucket, key = %key, bytes, "object fetched");

        let document = self.parser.parse(&dest).await?;
        let chunks = self.chunker.split(&document.text);
        info!(chunks = chunks.len(), "document chunked");

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let store = SqliteVectorStore::connect(&self.location).await?;
        let table = store
            .open_or_create_table(&self.table_name, self.embedder.width())
            .await?;

        let rows: Vec<VectorRow> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRow::new(chunk.text, vector))
            .collect();
        let rows_upserted = table.upsert_rows(rows).await?;
        let table_rows = table.count_rows().await?;

        Ok(IngestReport {
            key,
            chunks: texts.len(),
            rows_upserted,
            table_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_uses_the_status_code_field_name() {
        assert_eq!(
            serde_json::to_value(FlowResponse::success()).unwrap(),
            serde_json::json!({"statusCode": 201, "body": {"message": "OK"}})
        );
    }

    #[test]
    fn failure_response_carries_the_error_text() {
        let response = FlowResponse::failure("transfer failed: object 'a.pdf' does not exist");
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body.message,
            "transfer failed: object 'a.pdf' does not exist"
        );
    }

    #[test]
    fn responses_round_trip_through_json() {
        let json = r#"{"statusCode":201,"body":{"message":"OK"}}"#;
        let parsed: FlowResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, FlowResponse::success());
    }
}
