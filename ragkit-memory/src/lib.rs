//! Append-only conversation memory for RagKit pipelines.
//!
//! A [`ConversationMemory`] is an ordered log of question/answer turns
//! scoped by conversation id. Appends within one conversation are
//! serialized; unrelated conversations never contend. There is no
//! mutation or deletion API — a log's lifecycle ends only by external
//! pruning.

pub mod inmemory;

pub use inmemory::InMemoryConversationMemory;

use async_trait::async_trait;
use ragkit_core::{ConversationTurn, Result};

/// An ordered, append-only log of conversation turns.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Append a single turn to its conversation's log.
    ///
    /// The stored timestamp is assigned at append time and never
    /// decreases within one conversation.
    async fn append(&self, turn: ConversationTurn) -> Result<()>;

    /// Append a user/assistant exchange under one lock acquisition, so
    /// no turn from another caller can land between the two.
    ///
    /// Both turns must carry the same conversation id.
    async fn append_exchange(
        &self,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<()>;

    /// Return up to `max_turns` of the most recent turns, oldest first.
    ///
    /// An unknown conversation id yields an empty log, not an error.
    async fn get(&self, conversation_id: &str, max_turns: usize) -> Result<Vec<ConversationTurn>>;
}
