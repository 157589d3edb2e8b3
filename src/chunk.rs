//! Fixed-size character chunking with overlap.

use crate::types::FerryError;

/// One bounded segment of a document's text.
///
/// Chunks from the same document are ordered by `index`; consecutive chunks
/// share the overlap declared in [`ChunkerConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Parameters for [`CharacterChunker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks. Must stay below
    /// `chunk_size`.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Sliding-window splitter over characters.
///
/// Splitting is a pure function of the input text and the configuration:
/// every chunk except the last is exactly `chunk_size` characters long, each
/// consecutive pair shares exactly `chunk_overlap` characters, and no chunk
/// is empty. Boundaries count Unicode scalar values, so multi-byte text
/// never splits inside a code point.
///
/// # Examples
///
/// ```rust
/// use docferry::chunk::{CharacterChunker, ChunkerConfig};
///
/// let chunker = CharacterChunker::new(ChunkerConfig {
///     chunk_size: 5,
///     chunk_overlap: 2,
/// })
/// .unwrap();
///
/// let chunks = chunker.split("abcdefgh");
/// assert_eq!(chunks[0].text, "abcde");
/// assert_eq!(chunks[1].text, "defgh");
/// ```
#[derive(Clone, Debug)]
pub struct CharacterChunker {
    config: ChunkerConfig,
}

impl CharacterChunker {
    /// Builds a chunker, rejecting degenerate parameters.
    pub fn new(config: ChunkerConfig) -> Result<Self, FerryError> {
        if config.chunk_size == 0 {
            return Err(FerryError::Config(
                "chunk size must be positive".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(FerryError::Config(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    /// The validated configuration this chunker runs with.
    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Splits `text` into overlapping chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let stride = size - self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + size).min(chars.len());
            chunks.push(Chunk {
                index: chunks.len(),
                text: chars[start..end].iter().collect(),
            });
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}
