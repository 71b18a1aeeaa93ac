//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document as produced by ingestion.
///
/// Immutable once created; after chunking, the pipeline operates on the
/// document's [`Chunk`]s and the document itself is not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The full text content.
    pub text: String,
    /// Open string-keyed metadata. Ingestion always sets `source` and
    /// `source_type`; file sources also set `file_name`.
    pub metadata: HashMap<String, String>,
    /// URI of the original source, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

/// A bounded segment of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{seq}`.
    pub id: String,
    /// The parent document's id.
    pub document_id: String,
    /// The text of this segment.
    pub text: String,
    /// Position in the parent document's chunk sequence.
    pub seq: usize,
    /// Start of the segment, in characters from the document start.
    pub start: usize,
    /// End of the segment (exclusive), in characters.
    pub end: usize,
    /// The embedding vector, set once the embedding client has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Metadata inherited from the parent document, plus `seq`.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// A short human-readable label for citations: the `source` metadata
    /// when present, otherwise the parent document id.
    pub fn source_label(&self) -> &str {
        self.metadata.get("source").map(String::as_str).unwrap_or(&self.document_id)
    }
}

/// A retrieved [`Chunk`] paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query vector (higher is closer).
    pub score: f32,
}
