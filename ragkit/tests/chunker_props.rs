//! Property tests for fixed-size chunking.

use std::collections::HashMap;

use proptest::prelude::*;
use ragkit::chunking::{Chunker, FixedSizeChunker};
use ragkit::document::{Chunk, Document};

fn doc(text: &str) -> Document {
    Document {
        id: "doc".to_string(),
        text: text.to_string(),
        metadata: HashMap::new(),
        source_uri: None,
    }
}

/// Undo the overlap: keep the first chunk whole, drop the leading
/// `overlap` characters of every later chunk, concatenate.
fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            out.push_str(&chunk.text);
        } else {
            out.extend(chunk.text.chars().skip(overlap));
        }
    }
    out
}

/// A chunk size and a strictly smaller overlap.
fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Removing overlaps and concatenating reconstructs the document
    /// exactly, for any text including multi-byte characters.
    #[test]
    fn reconstruction_round_trips((size, overlap) in arb_window(), text in ".{0,400}") {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        if text.is_empty() {
            prop_assert!(chunks.is_empty());
        } else {
            prop_assert_eq!(reconstruct(&chunks, overlap), text);
        }
    }

    /// No chunk exceeds the window, and every chunk after the first
    /// begins with the last `overlap` characters of its predecessor.
    #[test]
    fn windows_are_bounded_and_overlapping((size, overlap) in arb_window(), text in ".{1,400}") {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        prop_assert!(!chunks.is_empty());
        for chunk in &chunks {
            prop_assert!(chunk.text.chars().count() <= size);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let tail: String = prev[prev.len() - overlap..].iter().collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            prop_assert_eq!(tail, head);
        }
    }

    /// Chunk ids and sequence numbers line up with position.
    #[test]
    fn sequence_numbers_are_dense((size, overlap) in arb_window(), text in ".{1,400}") {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.seq, i);
            let expected_id = format!("doc_{i}");
            prop_assert_eq!(chunk.id.as_str(), expected_id.as_str());
        }
    }

    /// Text that fits the window comes back as exactly one chunk.
    #[test]
    fn short_text_is_a_single_chunk(size in 1usize..64, text in ".{1,400}") {
        let chunker = FixedSizeChunker::new(size, 0).unwrap();
        let chunks = chunker.chunk(&doc(&text));
        if text.chars().count() <= size {
            prop_assert_eq!(chunks.len(), 1);
            prop_assert_eq!(chunks[0].text.as_str(), text.as_str());
        }
    }
}
