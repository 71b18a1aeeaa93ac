//! Document chunking.
//!
//! Splitting is measured in characters, not bytes, so multi-byte text
//! never panics on a slice boundary. The invariant the chunker upholds:
//! dropping the first `overlap` characters of every chunk after the
//! first and concatenating the rest reconstructs the document exactly.

use ragkit_core::{Error, Result};

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text, offsets, and metadata
/// but no embeddings; embeddings are attached later by the engine.
pub trait Chunker: Send + Sync {
    /// Split a document into an ordered, gap-free sequence of chunks.
    ///
    /// Returns an empty `Vec` if the document text is empty.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size character windows with a fixed overlap.
///
/// Each chunk after the first repeats the last `overlap` characters of
/// its predecessor. Text shorter than `chunk_size` yields exactly one
/// chunk.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
}

impl FixedSizeChunker {
    /// Create a chunker with the given window size and overlap, both in
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `chunk_size` is zero or
    /// `overlap >= chunk_size` (the window would never advance).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than zero".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({overlap}) must be less than chunk size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character boundary, plus the end of text,
        // so windows measured in characters map to valid byte ranges.
        let mut bounds: Vec<usize> = document.text.char_indices().map(|(i, _)| i).collect();
        bounds.push(document.text.len());
        let char_count = bounds.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut seq = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            let text = document.text[bounds[start]..bounds[end]].to_string();

            let mut metadata = document.metadata.clone();
            metadata.insert("seq".to_string(), seq.to_string());

            chunks.push(Chunk {
                id: format!("{}_{seq}", document.id),
                document_id: document.id.clone(),
                text,
                seq,
                start,
                end,
                embedding: None,
                metadata,
            });

            if end == char_count {
                return chunks;
            }
            seq += 1;
            start += step;
        }
    }
}
