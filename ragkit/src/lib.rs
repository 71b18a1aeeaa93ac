//! Retrieval-augmented generation for Rust.
//!
//! `ragkit` wires document loading, chunking, embeddings, vector
//! search, prompt assembly, and answer generation into one engine with
//! two operations: [`RagEngine::ingest`] and [`RagEngine::answer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit::{EngineConfig, IngestRequest, QueryRequest, RagEngine, SourceType};
//! use ragkit::openai::{OpenAiChat, OpenAiEmbeddings};
//!
//! let engine = RagEngine::builder()
//!     .config(EngineConfig::builder().chunk_size(800).chunk_overlap(160).build()?)
//!     .embeddings(Arc::new(OpenAiEmbeddings::from_env()?))
//!     .generation(Arc::new(OpenAiChat::from_env()?))
//!     .build()?;
//!
//! let report = engine
//!     .ingest(&IngestRequest {
//!         source_location: "docs/".into(),
//!         source_type: SourceType::Directory,
//!     })
//!     .await?;
//!
//! let answer = engine.answer(QueryRequest::new("What does the setup guide say?")).await?;
//! println!("{} (sources: {:?})", answer.answer, answer.sources);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod generation;
pub mod index;
pub mod inmemory;
pub mod loader;
pub mod openai;
pub mod prompt;
pub mod retriever;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::EngineConfig;
pub use document::{Chunk, Document, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use engine::{Answer, IngestReport, IngestRequest, QueryRequest, RagEngine};
pub use generation::{
    GenerationClient, GenerationParams, GenerationRequest, Generator, PromptTurn,
};
pub use index::VectorIndex;
pub use inmemory::InMemoryVectorIndex;
pub use loader::{DocumentLoader, SourceType};
pub use prompt::{AssembledPrompt, PromptAssembler};
pub use retriever::Retriever;

pub use ragkit_core::{
    CancellationSource, CancellationToken, ConversationTurn, Error, ErrorKind, ErrorReport,
    Result, RetryPolicy, Role,
};
pub use ragkit_memory::{ConversationMemory, InMemoryConversationMemory};
