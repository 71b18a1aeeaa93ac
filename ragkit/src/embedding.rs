//! Embedding client trait.

use async_trait::async_trait;

use ragkit_core::Result;

/// A client that converts text into fixed-dimension vectors.
///
/// Two vectors are comparable only if produced by the same provider and
/// model; [`dimensions`](EmbeddingProvider::dimensions) reports the
/// dimension every returned vector has.
///
/// Implementations return [`Error::Upstream`](ragkit_core::Error::Upstream)
/// on transport failures, classified transient or permanent so the
/// retry policy knows what it may retry.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input, in order.
    ///
    /// The default implementation embeds sequentially; backends with
    /// native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// The dimension of every vector this provider produces.
    fn dimensions(&self) -> usize;
}
