//! Top-K chunk retrieval across every stored document.
//!
//! The query is embedded once, every stored chunk is cosine-scored against
//! it, and the candidates are stably sorted by score (descending) before
//! truncation. Cost is linear in the total number of stored chunks; there
//! is no index.

use crate::embedding::{embed_query, Embedder, EmbeddingError};
use crate::models::RetrievalCandidate;
use crate::store::{Store, StoreError};

/// Default number of candidates handed to the prompt composer.
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Return the `k` chunks most similar to `query`.
///
/// An empty store (or `k == 0`) short-circuits to an empty result without
/// calling the embedder.
pub async fn retrieve<S, E>(
    store: &S,
    embedder: &E,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievalCandidate>, RetrieveError>
where
    S: Store + ?Sized,
    E: Embedder + ?Sized,
{
    if k == 0 || store.is_empty().await? {
        return Ok(Vec::new());
    }

    let query_vec = embed_query(embedder, query).await?;
    let mut candidates = store.score_chunks(&query_vec).await?;
    rank(&mut candidates);
    candidates.truncate(k);
    Ok(candidates)
}

/// Sort candidates by descending score. Equal scores keep their order.
///
/// Uses `total_cmp`, so a stray `NaN` sorts to one end instead of breaking
/// the ordering of the finite scores.
pub fn rank(candidates: &mut [RetrievalCandidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}
