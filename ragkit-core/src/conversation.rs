//! Conversation data model shared by the memory and pipeline crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One user or assistant message within a conversation.
///
/// Turns are append-only: once stored they are never mutated or deleted
/// by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The conversation this turn belongs to.
    pub conversation_id: String,
    /// Who authored the turn.
    pub role: Role,
    /// The message text.
    pub text: String,
    /// When the turn was recorded. Within one conversation, timestamps
    /// never decrease in append order.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(conversation_id: impl Into<String>, role: Role, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
