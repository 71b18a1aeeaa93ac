//! Vector index trait.

use async_trait::async_trait;

use ragkit_core::Result;

use crate::document::{Chunk, ScoredChunk};

/// A store of chunk vectors with nearest-neighbor search.
///
/// The similarity metric is **cosine similarity**, fixed between index
/// build and query; scores are in `[-1, 1]` with higher meaning closer.
///
/// Implementations must tolerate concurrent reads during writes: a
/// chunk becomes visible to readers only once both its text and vector
/// are stored (read-after-write consistency per chunk, no global
/// ordering across chunks).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create a named collection for vectors of the given dimension.
    /// No-op if it already exists with the same dimension.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and everything in it.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Store or replace chunks, keyed by chunk id. Every chunk must
    /// carry an embedding of the collection's dimension.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Remove all chunks belonging to a document.
    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<()>;

    /// Return the `k` nearest chunks by cosine similarity, sorted by
    /// non-increasing score, excluding any below `min_score`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](ragkit_core::Error::NotFound) for a missing
    /// or empty collection;
    /// [`Error::DimensionMismatch`](ragkit_core::Error::DimensionMismatch)
    /// when the query vector's dimension differs from the collection's.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredChunk>>;
}
