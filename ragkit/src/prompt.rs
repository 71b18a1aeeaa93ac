//! Prompt assembly: retrieved context, conversation history, question.

use tracing::debug;

use ragkit_core::ConversationTurn;

use crate::document::ScoredChunk;
use crate::generation::{GenerationRequest, PromptTurn};

const GROUNDED_INSTRUCTIONS: &str = "You are a helpful assistant that answers questions using the \
numbered context passages below. If the context does not contain the answer, say you do not know \
instead of guessing. Cite the passages you used by their bracketed number.";

const NO_CONTEXT_INSTRUCTIONS: &str = "You are a helpful assistant. No relevant context was found \
in the knowledge base for this question. Say that you could not find relevant information, and \
answer from the conversation alone only if you are confident.";

/// The assembled request plus the ids of the chunks it actually cites.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// The request to hand to the generation client.
    pub request: GenerationRequest,
    /// Ids of the chunks included in the context block, best first.
    pub cited_chunks: Vec<String>,
}

/// Merges retrieved chunks, prior turns, and the current question into
/// one [`GenerationRequest`].
///
/// History is bounded by a turn count and the whole prompt by a
/// character budget. When over budget, the oldest turns are dropped
/// first, then the lowest-ranked chunks; the current question and the
/// top-ranked chunk always survive.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_turns: usize,
    budget: usize,
}

/// Per-turn overhead (role tag, separators) counted against the budget.
const TURN_OVERHEAD: usize = 16;

impl PromptAssembler {
    /// Create an assembler with the given history bound and character
    /// budget.
    pub fn new(max_turns: usize, budget: usize) -> Self {
        Self { max_turns, budget }
    }

    /// Assemble a generation request for `question`.
    ///
    /// `history` must be in chronological order, oldest first, as
    /// returned by the memory; `hits` must be sorted best first, as
    /// returned by the retriever.
    pub fn assemble(
        &self,
        question: &str,
        hits: &[ScoredChunk],
        history: &[ConversationTurn],
    ) -> AssembledPrompt {
        let bounded = &history[history.len().saturating_sub(self.max_turns)..];

        let mut turn_start = 0usize;
        let mut chunk_count = hits.len();

        let system = loop {
            let system = self.system_prompt(&hits[..chunk_count]);
            let turns_len: usize =
                bounded[turn_start..].iter().map(|t| t.text.len() + TURN_OVERHEAD).sum();
            if system.len() + turns_len + question.len() <= self.budget {
                break system;
            }
            if turn_start < bounded.len() {
                turn_start += 1;
            } else if chunk_count > 1 {
                chunk_count -= 1;
            } else {
                // Nothing left to shed: the question and the best chunk
                // are never dropped.
                break system;
            }
        };

        let cited_chunks: Vec<String> =
            hits[..chunk_count].iter().map(|hit| hit.chunk.id.clone()).collect();

        debug!(
            chunks = chunk_count,
            dropped_turns = turn_start,
            history_turns = bounded.len() - turn_start,
            "assembled prompt"
        );

        AssembledPrompt {
            request: GenerationRequest {
                system,
                history: bounded[turn_start..]
                    .iter()
                    .map(|turn| PromptTurn { role: turn.role, text: turn.text.clone() })
                    .collect(),
                question: question.to_string(),
            },
            cited_chunks,
        }
    }

    fn system_prompt(&self, hits: &[ScoredChunk]) -> String {
        if hits.is_empty() {
            return NO_CONTEXT_INSTRUCTIONS.to_string();
        }
        let mut prompt = String::from(GROUNDED_INSTRUCTIONS);
        prompt.push_str("\n\nContext:\n");
        for (i, hit) in hits.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] ({}) {}\n\n",
                i + 1,
                hit.chunk.source_label(),
                hit.chunk.text
            ));
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;
    use ragkit_core::Role;

    fn hit(id: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: id.to_string(),
                document_id: "doc".to_string(),
                text: text.to_string(),
                seq: 0,
                start: 0,
                end: 0,
                embedding: None,
                metadata: HashMap::from([("source".to_string(), "notes.txt".to_string())]),
            },
            score,
        }
    }

    fn turn(role: Role, text: &str) -> ConversationTurn {
        ConversationTurn::new("c1", role, text)
    }

    #[test]
    fn question_is_last_and_context_is_numbered() {
        let assembler = PromptAssembler::new(10, 10_000);
        let hits = [hit("a_0", "alpha", 0.9), hit("a_1", "beta", 0.7)];
        let assembled = assembler.assemble("what is alpha?", &hits, &[]);

        assert!(assembled.request.system.contains("[1] (notes.txt) alpha"));
        assert!(assembled.request.system.contains("[2] (notes.txt) beta"));
        assert_eq!(assembled.request.question, "what is alpha?");
        assert_eq!(assembled.cited_chunks, ["a_0", "a_1"]);
    }

    #[test]
    fn empty_retrieval_falls_back_to_no_context_prompt() {
        let assembler = PromptAssembler::new(10, 10_000);
        let assembled = assembler.assemble("anything?", &[], &[]);

        assert_eq!(assembled.request.system, NO_CONTEXT_INSTRUCTIONS);
        assert!(assembled.cited_chunks.is_empty());
    }

    #[test]
    fn history_is_bounded_and_chronological() {
        let assembler = PromptAssembler::new(2, 10_000);
        let history = [
            turn(Role::User, "first"),
            turn(Role::Assistant, "second"),
            turn(Role::User, "third"),
        ];
        let assembled = assembler.assemble("q", &[hit("a_0", "ctx", 0.9)], &history);

        let texts: Vec<&str> =
            assembled.request.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["second", "third"]);
    }

    #[test]
    fn over_budget_drops_oldest_turns_first() {
        let long = "x".repeat(200);
        let history = [
            turn(Role::User, &long),
            turn(Role::Assistant, &long),
            turn(Role::User, "recent question"),
            turn(Role::Assistant, "recent answer"),
        ];
        let hits = [hit("a_0", "small context", 0.9)];

        // Budget fits the system prompt, the question, and the two
        // recent turns, but not the two long old ones.
        let assembler = PromptAssembler::new(10, 400);
        let assembled = assembler.assemble("q", &hits, &history);

        let texts: Vec<&str> =
            assembled.request.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["recent question", "recent answer"]);
        assert_eq!(assembled.cited_chunks, ["a_0"]);
    }

    #[test]
    fn over_budget_then_drops_low_ranked_chunks_but_never_the_top() {
        let big = "y".repeat(300);
        let hits = [hit("a_0", &big, 0.9), hit("a_1", &big, 0.8), hit("a_2", &big, 0.7)];

        let assembler = PromptAssembler::new(10, 700);
        let assembled = assembler.assemble("q", &hits, &[]);

        assert_eq!(assembled.cited_chunks, ["a_0"]);
        assert!(assembled.request.system.contains("[1]"));
        assert!(!assembled.request.system.contains("[2]"));
        assert_eq!(assembled.request.question, "q");
    }

    #[test]
    fn question_survives_even_when_budget_is_hopeless() {
        let assembler = PromptAssembler::new(10, 300);
        let hits = [hit("a_0", &"z".repeat(500), 0.9)];
        let assembled = assembler.assemble("the question", &hits, &[]);

        assert_eq!(assembled.request.question, "the question");
        assert_eq!(assembled.cited_chunks, ["a_0"]);
    }
}
