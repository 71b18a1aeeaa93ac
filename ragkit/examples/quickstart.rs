//! # Quickstart
//!
//! Ingest a small in-process corpus, then ask questions against it.
//!
//! Uses deterministic hash-based embeddings and an echoing generation
//! client so it runs with **zero API keys**; swap in
//! `OpenAiEmbeddings::from_env()` and `OpenAiChat::from_env()` for real
//! answers.
//!
//! Run: `cargo run --example quickstart`

use std::sync::Arc;

use async_trait::async_trait;
use ragkit::generation::{GenerationClient, GenerationParams, GenerationRequest};
use ragkit::{
    EmbeddingProvider, EngineConfig, IngestRequest, QueryRequest, RagEngine, Result, SourceType,
};

// ---------------------------------------------------------------------------
// HashedEmbeddings — deterministic hash-based embeddings for demos/tests
// ---------------------------------------------------------------------------

struct HashedEmbeddings {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, value) in vector.iter_mut().enumerate() {
            *value = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// EchoChat — repeats the question and reports what it was shown
// ---------------------------------------------------------------------------

struct EchoChat;

#[async_trait]
impl GenerationClient for EchoChat {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _params: &GenerationParams,
    ) -> Result<String> {
        Ok(format!(
            "(echo) question: {:?}, context chars: {}, history turns: {}",
            request.question,
            request.system.len(),
            request.history.len()
        ))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    // Small chunks keep the demo output readable.
    let config = EngineConfig::builder()
        .collection("quickstart")
        .chunk_size(200)
        .chunk_overlap(40)
        .build()?;

    let engine = RagEngine::builder()
        .config(config)
        .embeddings(Arc::new(HashedEmbeddings { dimensions: 64 }))
        .generation(Arc::new(EchoChat))
        .build()?;

    // Write a tiny corpus to a temp directory and ingest it.
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("rust.txt"),
        "Rust is a systems programming language focused on safety, speed, and concurrency. \
         It achieves memory safety without a garbage collector through its ownership system.",
    )?;
    std::fs::write(
        dir.path().join("rag.md"),
        "Retrieval-Augmented Generation combines a retrieval system with a language model. \
         Documents are chunked, embedded, and stored in a vector index; at query time the \
         most relevant chunks are retrieved and fed to the model as context.",
    )?;

    let report = engine
        .ingest(&IngestRequest {
            source_location: dir.path().display().to_string(),
            source_type: SourceType::Directory,
        })
        .await?;
    println!(
        "Ingested {} documents as {} chunks.\n",
        report.documents_added, report.chunks_indexed
    );

    // Ask two questions in the same conversation.
    let mut request = QueryRequest::new("How does Rust achieve memory safety?");
    request.use_memory = true;
    let answer = engine.answer(request).await?;
    println!("Q1: {}", answer.answer);
    println!("    sources: {:?}", answer.sources);

    let mut request = QueryRequest::new("And what gets stored in the vector index?");
    request.conversation_id = Some(answer.conversation_id.clone());
    request.use_memory = true;
    let answer = engine.answer(request).await?;
    println!("Q2: {}", answer.answer);
    println!("    sources: {:?}", answer.sources);

    Ok(())
}
