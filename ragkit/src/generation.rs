//! Generation client trait and the retry-applying [`Generator`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragkit_core::{Error, Result, RetryPolicy, Role};

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 1000 }
    }
}

/// One prior turn as included in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTurn {
    /// Who authored the turn.
    pub role: Role,
    /// The turn's text.
    pub text: String,
}

/// A fully assembled generation request: system instructions (including
/// any retrieved context), prior turns in chronological order, and the
/// current question last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instructions, with the numbered context block when
    /// retrieval produced results.
    pub system: String,
    /// Prior conversation turns, oldest first.
    pub history: Vec<PromptTurn>,
    /// The current question.
    pub question: String,
}

/// A client that sends an assembled request to a language model.
///
/// Implementations return
/// [`Error::Upstream`](ragkit_core::Error::Upstream) on transport
/// failures, classified transient or permanent; the [`Generator`]
/// wrapper decides what to retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce a completion for the request.
    async fn generate(&self, request: &GenerationRequest, params: &GenerationParams)
        -> Result<String>;
}

/// Applies the shared retry policy around a [`GenerationClient`].
///
/// Transient upstream failures are retried with bounded backoff;
/// permanent failures (invalid request, authentication) surface
/// immediately. Either way the caller sees
/// [`Error::Generation`](ragkit_core::Error::Generation) with the cause
/// attached.
pub struct Generator {
    client: Arc<dyn GenerationClient>,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl Generator {
    /// Wrap a client with sampling parameters and a retry policy.
    pub fn new(client: Arc<dyn GenerationClient>, params: GenerationParams, retry: RetryPolicy) -> Self {
        Self { client, params, retry }
    }

    /// Generate a completion, retrying transient failures.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            history_turns = request.history.len(),
            system_len = request.system.len(),
            "generating completion"
        );
        match self.retry.run(|| self.client.generate(request, &self.params)).await {
            Ok(text) => Ok(text),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err @ Error::Generation { .. }) => Err(err),
            Err(err) if err.is_transient() => Err(Error::generation(
                format!("model call failed after {} attempts", self.retry.max_attempts()),
                err,
            )),
            Err(err) => Err(Error::generation("model rejected the request", err)),
        }
    }
}
