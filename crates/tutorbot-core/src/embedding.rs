//! Embedder trait, its error type, and the cosine similarity scorer.
//!
//! Concrete embedders (the OpenAI-compatible HTTP client) live in the
//! `tutorbot` app crate; this module only fixes the contract the retriever
//! and ingest pipeline rely on.

use async_trait::async_trait;

/// Score returned by [`cosine_similarity`] when a vector is absent or has
/// zero length. Ranks exactly like a genuine `-1.0`.
pub const NO_SIMILARITY: f32 = -1.0;

/// A failed embedding call.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("embedding request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("embedding API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider answered 2xx but the payload could not be interpreted.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Turns a batch of texts into a batch of vectors.
///
/// Implementations make one remote call per invocation, never retry, and
/// return exactly one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed `texts`, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Embed a single query text.
///
/// Convenience wrapper around [`Embedder::embed`] for the retriever.
pub async fn embed_query<E: Embedder + ?Sized>(
    embedder: &E,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let results = embedder.embed(&[text.to_string()]).await?;
    let actual = results.len();
    let mut iter = results.into_iter();
    match (iter.next(), actual) {
        (Some(v), 1) => Ok(v),
        _ => Err(EmbeddingError::CountMismatch {
            expected: 1,
            actual,
        }),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns [`NO_SIMILARITY`] instead of dividing by zero when either vector
/// is empty, the lengths differ, or either vector has zero norm. Sums are
/// accumulated in `f64`; a vector holding `inf` or `NaN` also scores
/// [`NO_SIMILARITY`], so the result is always finite.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return NO_SIMILARITY;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return NO_SIMILARITY;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !sim.is_finite() {
        return NO_SIMILARITY;
    }
    sim.clamp(-1.0, 1.0) as f32
}
