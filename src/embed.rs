//! Embedding clients for an OpenAI-compatible `/embeddings` endpoint.
//!
//! One request carries every chunk of the document being ingested. The
//! service may answer out of order, so responses are re-sorted by their
//! `index` field before vectors are handed back. Failures are terminal for
//! the invocation; there is no retry or backoff layer here.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::FerryError;

/// Capability to embed a batch of texts.
///
/// Returns one vector per input, in input order, each exactly [`width`]
/// entries long. Anything else from the underlying service is a
/// [`FerryError::Embedding`].
///
/// [`width`]: EmbeddingClient::width
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, FerryError>;

    /// Vector width this client produces; also the width of any table its
    /// output is stored in.
    fn width(&self) -> usize;
}

/// Settings for [`HttpEmbeddingClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Base URL of the service; `/embeddings` is appended.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Expected vector width.
    pub width: usize,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Whole-request timeout.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: "titan-embed-text".to_string(),
            width: 1536,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
    index: usize,
}

/// [`EmbeddingClient`] speaking the OpenAI-compatible wire shape.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    width: usize,
    api_key: Option<String>,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, FerryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| FerryError::Config(format!("embedding HTTP client: {err}")))?;
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: config.model,
            width: config.width,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, FerryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };
        let mut call = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|err| FerryError::Embedding(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(FerryError::Embedding(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let mut parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| FerryError::Embedding(format!("malformed response: {err}")))?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(FerryError::Embedding(format!(
                "endpoint returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        let vectors: Vec<Vec<f32>> = parsed
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect();
        if let Some(bad) = vectors.iter().find(|vector| vector.len() != self.width) {
            return Err(FerryError::Embedding(format!(
                "endpoint returned width {} where {} was configured",
                bad.len(),
                self.width
            )));
        }

        debug!(inputs = texts.len(), width = self.width, "texts embedded");
        Ok(vectors)
    }

    fn width(&self) -> usize {
        self.width
    }
}

/// Deterministic in-process [`EmbeddingClient`] for tests and local runs.
///
/// Vectors are derived from a hash of the input text, so the same text
/// always embeds to the same vector and a stored row is its own nearest
/// neighbor.
#[derive(Clone, Debug)]
pub struct MockEmbeddingClient {
    width: usize,
}

impl MockEmbeddingClient {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, FerryError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vector(text, self.width))
            .collect())
    }

    fn width(&self) -> usize {
        self.width
    }
}

fn hash_to_vector(text: &str, width: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();

    (0..width)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f32) / (u32::MAX as f32)
        })
        .collect()
}
