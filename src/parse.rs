//! Text extraction from downloaded files.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::task;
use tracing::debug;

use crate::types::FerryError;

/// Extracted text of one uploaded file.
///
/// The metadata map is always empty in this pipeline; it exists so stored
/// rows keep a metadata slot callers can rely on.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Wraps extracted text with an empty metadata map.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }
}

/// Capability to turn a downloaded file into a [`Document`].
///
/// Unsupported or corrupt input is a [`FerryError::Parse`] and terminal for
/// the invocation; no partial extraction is attempted.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<Document, FerryError>;
}

/// PDF parser that extracts the text of every page in page order.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    async fn parse(&self, path: &Path) -> Result<Document, FerryError> {
        let path = path.to_path_buf();
        // lopdf is synchronous; keep it off the async workers.
        let text = task::spawn_blocking(move || -> Result<String, FerryError> {
            let pdf =
                lopdf::Document::load(&path).map_err(|err| FerryError::Parse(err.to_string()))?;
            let pages: Vec<u32> = pdf.get_pages().keys().copied().collect();
            pdf.extract_text(&pages)
                .map_err(|err| FerryError::Parse(err.to_string()))
        })
        .await
        .map_err(|err| FerryError::Parse(err.to_string()))??;

        if text.trim().is_empty() {
            return Err(FerryError::Parse(
                "document contains no extractable text".to_string(),
            ));
        }
        debug!(chars = text.chars().count(), "document text extracted");
        Ok(Document::new(text))
    }
}
