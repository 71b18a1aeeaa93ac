//! End-to-end engine tests with deterministic in-process providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ragkit::generation::{GenerationClient, GenerationParams, GenerationRequest};
use ragkit::{
    CancellationSource, EmbeddingProvider, EngineConfig, Error, ErrorKind, IngestRequest,
    QueryRequest, RagEngine, Result, SourceType,
};

/// Deterministic hash-based embeddings: identical text maps to an
/// identical unit vector, so self-similarity is 1.
struct HashedEmbeddings {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
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

/// Echoes the question and counts calls.
struct EchoClient {
    calls: AtomicU32,
}

#[async_trait]
impl GenerationClient for EchoClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _params: &GenerationParams,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("echo: {}", request.question))
    }
}

fn engine() -> (RagEngine, Arc<EchoClient>) {
    let client = Arc::new(EchoClient { calls: AtomicU32::new(0) });
    let engine = RagEngine::builder()
        .config(
            EngineConfig::builder()
                .collection("test_docs")
                .chunk_size(50)
                .chunk_overlap(10)
                .build()
                .unwrap(),
        )
        .embeddings(Arc::new(HashedEmbeddings { dimensions: 32 }))
        .generation(client.clone())
        .build()
        .unwrap();
    (engine, client)
}

fn write_corpus(dir: &tempfile::TempDir) {
    std::fs::write(dir.path().join("sky.txt"), "The sky is blue. The grass is green.").unwrap();
    std::fs::write(
        dir.path().join("rust.md"),
        "Rust is a systems programming language focused on safety and speed.",
    )
    .unwrap();
}

#[tokio::test]
async fn ingest_then_answer_returns_sources() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir);
    let (engine, _client) = engine();

    let report = engine
        .ingest(&IngestRequest {
            source_location: dir.path().display().to_string(),
            source_type: SourceType::Directory,
        })
        .await
        .unwrap();
    assert_eq!(report.documents_added, 2);
    assert!(report.chunks_indexed >= 2);

    let answer = engine.answer(QueryRequest::new("What color is the sky?")).await.unwrap();
    assert_eq!(answer.answer, "echo: What color is the sky?");
    assert!(!answer.sources.is_empty());
    assert!(answer.sources.len() <= 4);
    assert!(!answer.conversation_id.is_empty());
}

#[tokio::test]
async fn k_caps_results_but_small_indexes_are_not_padded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tiny.txt"), "just one small document").unwrap();
    let (engine, _client) = engine();

    engine
        .ingest(&IngestRequest {
            source_location: dir.path().join("tiny.txt").display().to_string(),
            source_type: SourceType::File,
        })
        .await
        .unwrap();

    // One short document yields one chunk; k=4 must return exactly it.
    let answer = engine.answer(QueryRequest::new("anything")).await.unwrap();
    assert_eq!(answer.sources.len(), 1);
}

#[tokio::test]
async fn query_before_any_ingest_is_not_found() {
    let (engine, _client) = engine();
    let err = engine.answer(QueryRequest::new("anything")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFoundError);
}

#[tokio::test]
async fn conversation_memory_records_the_exchange() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir);
    let (engine, _client) = engine();
    engine
        .ingest(&IngestRequest {
            source_location: dir.path().display().to_string(),
            source_type: SourceType::Directory,
        })
        .await
        .unwrap();

    let mut request = QueryRequest::new("first question");
    request.conversation_id = Some("c1".to_string());
    request.use_memory = true;
    engine.answer(request).await.unwrap();

    let turns = engine.memory().get("c1", 10).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].text, "first question");
    assert_eq!(turns[1].text, "echo: first question");
}

#[tokio::test]
async fn minted_conversation_ids_are_returned_and_usable() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir);
    let (engine, _client) = engine();
    engine
        .ingest(&IngestRequest {
            source_location: dir.path().display().to_string(),
            source_type: SourceType::Directory,
        })
        .await
        .unwrap();

    let answer = engine.answer(QueryRequest::new("hello")).await.unwrap();
    let turns = engine.memory().get(&answer.conversation_id, 10).await.unwrap();
    assert_eq!(turns.len(), 2);
}

#[tokio::test]
async fn cancelled_queries_never_reach_generation_or_memory() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir);
    let (engine, client) = engine();
    engine
        .ingest(&IngestRequest {
            source_location: dir.path().display().to_string(),
            source_type: SourceType::Directory,
        })
        .await
        .unwrap();

    let source = CancellationSource::new();
    let token = source.token();
    source.cancel();

    let mut request = QueryRequest::new("doomed question");
    request.conversation_id = Some("c-cancelled".to_string());
    let err = engine.answer_with_cancellation(request, token).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert!(engine.memory().get("c-cancelled", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_question_is_rejected_up_front() {
    let (engine, _client) = engine();
    let err = engine.answer(QueryRequest::new("   ")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}

#[tokio::test]
async fn deleting_a_document_removes_it_from_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("only.txt"), "a single document to remove").unwrap();
    let (engine, _client) = engine();
    engine
        .ingest(&IngestRequest {
            source_location: dir.path().join("only.txt").display().to_string(),
            source_type: SourceType::File,
        })
        .await
        .unwrap();

    let answer = engine.answer(QueryRequest::new("anything")).await.unwrap();
    let chunk_id = &answer.sources[0];
    let document_id = chunk_id.rsplit_once('_').unwrap().0;
    engine.delete_document(document_id).await.unwrap();

    // The collection still exists but holds nothing.
    let err = engine.answer(QueryRequest::new("anything")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFoundError);
}
