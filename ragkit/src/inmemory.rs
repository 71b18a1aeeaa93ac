//! In-memory vector index using cosine similarity.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use ragkit_core::{Error, Result};

use crate::document::{Chunk, ScoredChunk};
use crate::index::VectorIndex;

struct Collection {
    dimensions: usize,
    chunks: HashMap<String, Chunk>,
}

/// An in-process [`VectorIndex`] backed by a `HashMap` behind a
/// `tokio::sync::RwLock`.
///
/// Writers insert fully-populated chunk records under the write lock,
/// so a reader can never observe a chunk without its vector. Suitable
/// for development, testing, and small corpora.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(name) {
            Some(existing) if existing.dimensions != dimensions => {
                Err(Error::Configuration(format!(
                    "collection '{name}' already exists with dimension {}, requested {dimensions}",
                    existing.dimensions
                )))
            }
            Some(_) => Ok(()),
            None => {
                collections
                    .insert(name.to_string(), Collection { dimensions, chunks: HashMap::new() });
                debug!(collection = name, dimensions, "created collection");
                Ok(())
            }
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| Error::not_found("collection", collection))?;

        for chunk in chunks {
            let vector = chunk.embedding.as_ref().ok_or_else(|| {
                Error::Configuration(format!("chunk '{}' has no embedding", chunk.id))
            })?;
            if vector.len() != store.dimensions {
                return Err(Error::DimensionMismatch {
                    expected: store.dimensions,
                    actual: vector.len(),
                });
            }
            store.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| Error::not_found("collection", collection))?;

        let before = store.chunks.len();
        store.chunks.retain(|_, chunk| chunk.document_id != document_id);
        debug!(collection, document_id, removed = before - store.chunks.len(), "deleted document");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| Error::not_found("collection", collection))?;
        if store.chunks.is_empty() {
            return Err(Error::not_found("collection", collection));
        }
        if vector.len() != store.dimensions {
            return Err(Error::DimensionMismatch {
                expected: store.dimensions,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = store
            .chunks
            .values()
            .map(|chunk| {
                let embedding = chunk.embedding.as_deref().unwrap_or_default();
                ScoredChunk { chunk: chunk.clone(), score: cosine_similarity(embedding, vector) }
            })
            .filter(|hit| min_score.is_none_or(|threshold| hit.score >= threshold))
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}
