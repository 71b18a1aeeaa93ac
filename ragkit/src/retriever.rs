//! Query-side retrieval: embed the question, search the index.

use std::sync::Arc;

use tracing::debug;

use ragkit_core::{Error, Result, RetryPolicy};

use crate::document::ScoredChunk;
use crate::embedding::EmbeddingProvider;
use crate::index::VectorIndex;

/// Embeds queries and fetches the best-matching chunks.
///
/// Embedding calls go through the shared retry policy; a failure that
/// survives the budget surfaces as
/// [`Error::Retrieval`](ragkit_core::Error::Retrieval) with the cause
/// attached. Index errors (`NotFound`, `DimensionMismatch`) pass
/// through unchanged.
pub struct Retriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    retry: RetryPolicy,
}

impl Retriever {
    /// Create a retriever over the given collection.
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self { embeddings, index, collection: collection.into(), retry }
    }

    /// Return up to `k` chunks matching the question, best first.
    ///
    /// An empty result (every stored chunk below `min_score`) is a
    /// valid outcome, not an error.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredChunk>> {
        let vector =
            self.retry.run(|| self.embeddings.embed(question)).await.map_err(|err| match err {
                Error::Cancelled => Error::Cancelled,
                err => Error::retrieval("query embedding failed", err),
            })?;

        let hits = self.index.search(&self.collection, &vector, k, min_score).await?;
        debug!(collection = %self.collection, k, hits = hits.len(), "retrieval complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::document::Chunk;
    use crate::inmemory::InMemoryVectorIndex;
    use ragkit_core::ErrorKind;

    /// Embeds along a fixed axis, failing transiently `failures` times.
    struct FlakyEmbedder {
        axis: usize,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyEmbedder {
        fn new(axis: usize, failures: u32) -> Self {
            Self { axis, failures, calls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(Error::upstream("mock", "connection reset", true));
            }
            let mut v = vec![0.0; 3];
            v[self.axis] = 1.0;
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "doc".to_string(),
            text: id.to_string(),
            seq: 0,
            start: 0,
            end: 0,
            embedding: Some(embedding),
            metadata: HashMap::new(),
        }
    }

    async fn seeded_index() -> Arc<InMemoryVectorIndex> {
        let index = Arc::new(InMemoryVectorIndex::new());
        index.create_collection("docs", 3).await.unwrap();
        index
            .upsert(
                "docs",
                &[chunk("x", vec![1.0, 0.0, 0.0]), chunk("y", vec![0.0, 1.0, 0.0])],
            )
            .await
            .unwrap();
        index
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_from_transient_embedding_failures() {
        let index = seeded_index().await;
        let retriever = Retriever::new(
            Arc::new(FlakyEmbedder::new(0, 2)),
            index,
            "docs",
            RetryPolicy::new(3, Duration::from_millis(50)),
        );

        let hits = retriever.retrieve("anything", 4, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "x");
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_embedding_failure_surfaces_as_retrieval_error() {
        let index = seeded_index().await;
        let retriever = Retriever::new(
            Arc::new(FlakyEmbedder::new(0, 100)),
            index,
            "docs",
            RetryPolicy::new(3, Duration::from_millis(50)),
        );

        let err = retriever.retrieve("anything", 4, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RetrievalError);
        assert!(err.report().cause.is_some());
    }

    #[tokio::test]
    async fn everything_below_threshold_is_a_valid_empty_result() {
        let index = seeded_index().await;
        let retriever = Retriever::new(
            Arc::new(FlakyEmbedder::new(2, 0)),
            index,
            "docs",
            RetryPolicy::default(),
        );

        // The query axis is orthogonal to every stored chunk.
        let hits = retriever.retrieve("anything", 4, Some(0.5)).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn missing_collection_passes_through_as_not_found() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let retriever = Retriever::new(
            Arc::new(FlakyEmbedder::new(0, 0)),
            index,
            "docs",
            RetryPolicy::default(),
        );

        let err = retriever.retrieve("anything", 4, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFoundError);
    }
}
