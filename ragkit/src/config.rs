//! Engine configuration.

use serde::{Deserialize, Serialize};

use ragkit_core::{Error, Result};

/// Configuration parameters for a [`RagEngine`](crate::RagEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The vector index collection all operations target.
    pub collection: String,
    /// Maximum chunk size, in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// Minimum similarity score for retrieved chunks; `None` keeps all.
    pub score_threshold: Option<f32>,
    /// How many prior turns the prompt may include.
    pub memory_turns: usize,
    /// Character budget for the assembled prompt.
    pub prompt_budget: usize,
    /// Sampling temperature passed to the generation model.
    pub temperature: f32,
    /// Completion token cap passed to the generation model.
    pub max_tokens: u32,
    /// Timeout for each outbound HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection: "rag_documents".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            score_threshold: None,
            memory_turns: 10,
            prompt_budget: 12_000,
            temperature: 0.7,
            max_tokens: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for constructing an [`EngineConfig`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the collection name all operations target.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the minimum similarity score for retrieved chunks.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.config.score_threshold = Some(threshold);
        self
    }

    /// Set how many prior turns the prompt may include.
    pub fn memory_turns(mut self, turns: usize) -> Self {
        self.config.memory_turns = turns;
        self
    }

    /// Set the character budget for assembled prompts.
    pub fn prompt_budget(mut self, budget: usize) -> Self {
        self.config.prompt_budget = budget;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the completion token cap.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the per-request HTTP timeout in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the [`EngineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `collection` is empty
    /// - `prompt_budget` is too small to hold a question
    /// - `request_timeout_secs == 0`
    pub fn build(self) -> Result<EngineConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than zero".into()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.collection.is_empty() {
            return Err(Error::Configuration("collection name must not be empty".into()));
        }
        if config.prompt_budget < 256 {
            return Err(Error::Configuration(format!(
                "prompt_budget ({}) is too small to hold a question",
                config.prompt_budget
            )));
        }
        if config.request_timeout_secs == 0 {
            return Err(Error::Configuration("request_timeout_secs must be greater than zero".into()));
        }
        Ok(config)
    }
}
