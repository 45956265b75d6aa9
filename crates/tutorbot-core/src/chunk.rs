//! Overlapping word-window text chunker.
//!
//! Splits document text into chunks of at most `max_words` words. Each
//! window starts `max_words - overlap` words after the previous one, so
//! neighbouring chunks share `overlap` words and a sentence straddling a
//! boundary appears whole in at least one chunk.
//!
//! # Algorithm
//!
//! 1. Split the text on any whitespace into a word list.
//! 2. Starting at word 0, take up to `max_words` words and join them with
//!    single spaces.
//! 3. Advance the start by the stride (`max_words - overlap`).
//! 4. Stop once the start reaches or passes the word count.
//!
//! The last window may be shorter than `max_words`. Empty or
//! whitespace-only text produces no chunks.
//!
//! # Example
//!
//! ```rust
//! use tutorbot_core::chunk::{chunk_text, ChunkParams};
//!
//! let params = ChunkParams::new(4, 1).unwrap();
//! let chunks = chunk_text("a b c d e f g", &params);
//! assert_eq!(chunks, vec!["a b c d", "d e f g", "g"]);
//! ```

use serde::Deserialize;

/// Default window size in words.
pub const DEFAULT_MAX_WORDS: usize = 200;

/// Default number of words shared by consecutive windows.
pub const DEFAULT_OVERLAP: usize = 40;

/// Rejected chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("max_words must be > 0")]
    ZeroWindow,

    #[error("overlap ({overlap}) must be smaller than max_words ({max_words})")]
    OverlapTooLarge { max_words: usize, overlap: usize },
}

/// Validated window parameters.
///
/// Construction through [`ChunkParams::new`] guarantees a positive stride,
/// so [`chunk_text`] always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawChunkParams")]
pub struct ChunkParams {
    max_words: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(max_words: usize, overlap: usize) -> Result<Self, ChunkError> {
        if max_words == 0 {
            return Err(ChunkError::ZeroWindow);
        }
        if overlap >= max_words {
            return Err(ChunkError::OverlapTooLarge { max_words, overlap });
        }
        Ok(Self { max_words, overlap })
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of words the window advances per step. Always `>= 1`.
    pub fn stride(&self) -> usize {
        self.max_words - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

#[derive(Deserialize)]
struct RawChunkParams {
    #[serde(default = "default_max_words")]
    max_words: usize,
    #[serde(default = "default_overlap")]
    overlap: usize,
}

fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

impl TryFrom<RawChunkParams> for ChunkParams {
    type Error = ChunkError;

    fn try_from(raw: RawChunkParams) -> Result<Self, Self::Error> {
        ChunkParams::new(raw.max_words, raw.overlap)
    }
}

/// Split `text` into overlapping word windows.
///
/// # Guarantees
///
/// - Chunks are returned in source order.
/// - Every chunk holds between 1 and `max_words` words.
/// - Text with at most `max_words` words yields exactly one chunk.
/// - Empty text yields no chunks.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = params.stride();

    let mut chunks = Vec::with_capacity(words.len().div_ceil(stride));
    let mut start = 0;
    while start < words.len() {
        let end = (start + params.max_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }
    chunks
}
