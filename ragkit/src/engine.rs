//! The engine wiring every pipeline stage behind the two public
//! operations: ingestion and question answering.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ragkit_core::{
    CancellationToken, ConversationTurn, Error, Result, RetryPolicy, Role,
};
use ragkit_memory::{ConversationMemory, InMemoryConversationMemory};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::EngineConfig;
use crate::embedding::EmbeddingProvider;
use crate::generation::{GenerationClient, GenerationParams, Generator};
use crate::index::VectorIndex;
use crate::inmemory::InMemoryVectorIndex;
use crate::loader::{DocumentLoader, SourceType};
use crate::prompt::PromptAssembler;
use crate::retriever::Retriever;

/// The transport-agnostic query contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer.
    pub question: String,
    /// The conversation this query belongs to; a fresh id is minted
    /// when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// How many chunks to retrieve.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Whether prior turns are included in the prompt.
    #[serde(default)]
    pub use_memory: bool,
}

fn default_k() -> usize {
    4
}

impl QueryRequest {
    /// A request with the default `k` and no memory.
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), conversation_id: None, k: default_k(), use_memory: false }
    }
}

/// The answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text.
    pub answer: String,
    /// Ids of the chunks the prompt cited, best first.
    pub sources: Vec<String>,
    /// The conversation the exchange was recorded under.
    pub conversation_id: String,
}

/// The transport-agnostic ingestion contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Path or URL to ingest.
    pub source_location: String,
    /// How to interpret `source_location`.
    pub source_type: SourceType,
}

/// What one ingestion run accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents successfully loaded and chunked.
    pub documents_added: usize,
    /// Chunks embedded and stored in the index.
    pub chunks_indexed: usize,
}

/// The pipeline orchestrator.
///
/// Construct one via [`RagEngine::builder()`]. Ingestion runs
/// load → chunk → embed → upsert; answering runs
/// retrieve → assemble → generate → record, with the conversation
/// exchange recorded only after generation fully succeeds.
pub struct RagEngine {
    config: EngineConfig,
    loader: DocumentLoader,
    chunker: Arc<dyn Chunker>,
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    memory: Arc<dyn ConversationMemory>,
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Generator,
    retry: RetryPolicy,
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The conversation memory backing this engine.
    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    /// The vector index backing this engine.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Ingest documents from a file, directory, or URL.
    ///
    /// Runs load → chunk → embed → upsert against the configured
    /// collection, creating it if needed. Embedding goes through the
    /// retry policy; a failure that survives the budget aborts the run.
    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestReport> {
        self.index
            .create_collection(&self.config.collection, self.embeddings.dimensions())
            .await?;

        let documents =
            self.loader.load(&request.source_location, request.source_type).await?;

        let mut chunks_indexed = 0usize;
        for document in &documents {
            let mut chunks = self.chunker.chunk(document);
            if chunks.is_empty() {
                info!(document.id = %document.id, "document produced no chunks");
                continue;
            }

            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self
                .retry
                .run(|| self.embeddings.embed_batch(&texts))
                .await
                .map_err(|err| match err {
                    Error::Cancelled => Error::Cancelled,
                    err => Error::retrieval(
                        format!("embedding failed for document '{}'", document.id),
                        err,
                    ),
                })?;
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = Some(embedding);
            }

            self.index.upsert(&self.config.collection, &chunks).await?;
            chunks_indexed += chunks.len();
            info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        }

        Ok(IngestReport { documents_added: documents.len(), chunks_indexed })
    }

    /// Remove a previously ingested document's chunks from the index.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.index.delete_document(&self.config.collection, document_id).await
    }

    /// Answer a query without a cancellation path.
    pub async fn answer(&self, request: QueryRequest) -> Result<Answer> {
        self.answer_with_cancellation(request, CancellationToken::none()).await
    }

    /// Answer a query, aborting if `cancel` fires.
    ///
    /// Cancellation discards all partial work: nothing is appended to
    /// conversation memory unless generation fully succeeded.
    pub async fn answer_with_cancellation(
        &self,
        request: QueryRequest,
        cancel: CancellationToken,
    ) -> Result<Answer> {
        if request.question.trim().is_empty() {
            return Err(Error::Configuration("question must not be empty".into()));
        }
        if request.k == 0 {
            return Err(Error::Configuration("k must be at least 1".into()));
        }

        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let hits = cancel
            .guard(self.retriever.retrieve(
                &request.question,
                request.k,
                self.config.score_threshold,
            ))
            .await?;

        let history = if request.use_memory {
            cancel.guard(self.memory.get(&conversation_id, self.config.memory_turns)).await?
        } else {
            Vec::new()
        };

        let assembled = self.assembler.assemble(&request.question, &hits, &history);
        let completion = cancel.guard(self.generator.generate(&assembled.request)).await?;

        // The exchange is recorded only once generation has succeeded;
        // a cancelled or failed query leaves no partial turns behind.
        let user = ConversationTurn::new(&conversation_id, Role::User, &request.question);
        let assistant = ConversationTurn::new(&conversation_id, Role::Assistant, &completion);
        self.memory.append_exchange(user, assistant).await?;

        info!(
            conversation_id = %conversation_id,
            sources = assembled.cited_chunks.len(),
            "answered query"
        );

        Ok(Answer {
            answer: completion,
            sources: assembled.cited_chunks,
            conversation_id,
        })
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// An embedding provider and a generation client are required; the
/// index, memory, chunker, config, and retry policy all have in-process
/// defaults.
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<EngineConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    generation: Option<Arc<dyn GenerationClient>>,
    index: Option<Arc<dyn VectorIndex>>,
    memory: Option<Arc<dyn ConversationMemory>>,
    retry: Option<RetryPolicy>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the default fixed-size chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider (required).
    pub fn embeddings(mut self, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Set the generation client (required).
    pub fn generation(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation = Some(client);
        self
    }

    /// Override the default in-memory vector index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the default in-memory conversation memory.
    pub fn memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Override the default retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the [`RagEngine`], validating required parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the embedding provider or
    /// generation client is missing, or if the configuration's chunk
    /// parameters are inconsistent.
    pub fn build(self) -> Result<RagEngine> {
        let config = self.config.unwrap_or_default();
        let embeddings = self
            .embeddings
            .ok_or_else(|| Error::Configuration("embedding provider is required".into()))?;
        let generation = self
            .generation
            .ok_or_else(|| Error::Configuration("generation client is required".into()))?;
        let index = self.index.unwrap_or_else(|| Arc::new(InMemoryVectorIndex::new()));
        let memory =
            self.memory.unwrap_or_else(|| Arc::new(InMemoryConversationMemory::new()));
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };
        let retry = self.retry.unwrap_or_default();

        let loader = DocumentLoader::new(Duration::from_secs(config.request_timeout_secs))?;
        let retriever = Retriever::new(
            Arc::clone(&embeddings),
            Arc::clone(&index),
            config.collection.clone(),
            retry.clone(),
        );
        let assembler = PromptAssembler::new(config.memory_turns, config.prompt_budget);
        let generator = Generator::new(
            generation,
            GenerationParams { temperature: config.temperature, max_tokens: config.max_tokens },
            retry.clone(),
        );

        Ok(RagEngine {
            config,
            loader,
            chunker,
            embeddings,
            index,
            memory,
            retriever,
            assembler,
            generator,
            retry,
        })
    }
}
