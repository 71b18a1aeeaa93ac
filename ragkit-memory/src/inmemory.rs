//! In-process conversation memory with per-conversation serialization.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use ragkit_core::{ConversationTurn, Error, Result};

use crate::ConversationMemory;

/// An append-only, in-process conversation log.
///
/// Each conversation id owns its own `Mutex`-guarded `Vec`, so appends
/// within one conversation are serialized while unrelated conversations
/// proceed in parallel. The outer map is locked only long enough to find
/// or create a conversation's log, never across an append.
#[derive(Debug, Default)]
pub struct InMemoryConversationMemory {
    conversations: RwLock<HashMap<String, Arc<Mutex<Vec<ConversationTurn>>>>>,
}

impl InMemoryConversationMemory {
    /// Create a new empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    async fn log_for(&self, conversation_id: &str) -> Arc<Mutex<Vec<ConversationTurn>>> {
        if let Some(log) = self.conversations.read().await.get(conversation_id) {
            return Arc::clone(log);
        }
        let mut conversations = self.conversations.write().await;
        Arc::clone(conversations.entry(conversation_id.to_string()).or_default())
    }

    /// Restamp `turn` so timestamps never decrease within a conversation.
    fn stamp(log: &[ConversationTurn], mut turn: ConversationTurn) -> ConversationTurn {
        let now = Utc::now();
        turn.timestamp = match log.last() {
            Some(last) => now.max(last.timestamp),
            None => now,
        };
        turn
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn append(&self, turn: ConversationTurn) -> Result<()> {
        let log = self.log_for(&turn.conversation_id).await;
        let mut log = log.lock().await;
        let turn = Self::stamp(&log, turn);
        debug!(conversation_id = %turn.conversation_id, turns = log.len() + 1, "appending turn");
        log.push(turn);
        Ok(())
    }

    async fn append_exchange(
        &self,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<()> {
        if user.conversation_id != assistant.conversation_id {
            return Err(Error::Configuration(format!(
                "exchange spans conversations '{}' and '{}'",
                user.conversation_id, assistant.conversation_id
            )));
        }
        let log = self.log_for(&user.conversation_id).await;
        let mut log = log.lock().await;
        let user = Self::stamp(&log, user);
        log.push(user);
        let assistant = Self::stamp(&log, assistant);
        log.push(assistant);
        Ok(())
    }

    async fn get(&self, conversation_id: &str, max_turns: usize) -> Result<Vec<ConversationTurn>> {
        let log = {
            let conversations = self.conversations.read().await;
            match conversations.get(conversation_id) {
                Some(log) => Arc::clone(log),
                None => return Ok(Vec::new()),
            }
        };
        let log = log.lock().await;
        let skip = log.len().saturating_sub(max_turns);
        Ok(log[skip..].to_vec())
    }
}
