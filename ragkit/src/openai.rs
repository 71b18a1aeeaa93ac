//! OpenAI-compatible HTTP clients for embeddings and chat completions.
//!
//! Both clients speak the plain REST API through `reqwest` and classify
//! transport failures for the retry policy: timeouts, connection
//! errors, 408, 429, and 5xx are transient; other HTTP errors are
//! permanent. The base URL is configurable, so any OpenAI-compatible
//! server works.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use ragkit_core::{Error, Result};

use crate::embedding::EmbeddingProvider;
use crate::generation::{GenerationClient, GenerationParams, GenerationRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))
}

fn require_api_key(provider: &str, api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(Error::Configuration(format!("{provider} API key must not be empty")));
    }
    Ok(())
}

fn api_key_from_env(provider: &str) -> Result<String> {
    std::env::var("OPENAI_API_KEY").map_err(|_| {
        Error::Configuration(format!(
            "OPENAI_API_KEY environment variable not set ({provider})"
        ))
    })
}

/// Map a `reqwest` failure to a classified upstream error.
fn request_error(provider: &'static str, err: reqwest::Error) -> Error {
    let transient = err.is_timeout() || err.is_connect();
    Error::upstream(provider, format!("request failed: {err}"), transient)
}

/// Map a non-success HTTP status to a classified upstream error.
fn status_error(provider: &'static str, status: StatusCode, detail: String) -> Error {
    let transient = status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error();
    Error::upstream(provider, format!("API returned {status}: {detail}"), transient)
}

/// Pull the error message out of an API error body, falling back to the
/// raw body text.
async fn error_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorBody>(&body).map(|e| e.error.message).unwrap_or(body)
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the `/embeddings` endpoint.
///
/// Defaults to `text-embedding-3-small` (1536 dimensions); the API key
/// comes from the constructor or the `OPENAI_API_KEY` environment
/// variable.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddings {
    /// Create a provider with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_api_key("OpenAI", &api_key)?;
        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env("embeddings")?)
    }

    /// Set the model name. The caller must also set
    /// [`with_dimensions`](Self::with_dimensions) if the model's output
    /// dimension differs from the default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimension reported by
    /// [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct EmbeddingApiRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingApiDatum>,
}

#[derive(Deserialize)]
struct EmbeddingApiDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| {
            Error::upstream("openai-embeddings", "API returned an empty response", false)
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingApiRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| request_error("openai-embeddings", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(%status, "embedding request rejected");
            return Err(status_error("openai-embeddings", status, detail));
        }

        let parsed: EmbeddingApiResponse = response.json().await.map_err(|e| {
            Error::upstream("openai-embeddings", format!("failed to parse response: {e}"), false)
        })?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`GenerationClient`] backed by the `/chat/completions` endpoint.
///
/// The assembled request maps to one system message, the prior turns in
/// order, and the current question as the final user message.
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Create a client with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_api_key("OpenAI", &api_key)?;
        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env("chat")?)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct ChatApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Vec<ChatApiChoice>,
}

#[derive(Deserialize)]
struct ChatApiChoice {
    message: ChatApiResponseMessage,
}

#[derive(Deserialize)]
struct ChatApiResponseMessage {
    content: String,
}

#[async_trait]
impl GenerationClient for OpenAiChat {
    async fn generate(
        &self,
        request: &GenerationRequest,
        params: &GenerationParams,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatApiMessage { role: "system", content: &request.system });
        for turn in &request.history {
            messages.push(ChatApiMessage { role: turn.role.as_str(), content: &turn.text });
        }
        messages.push(ChatApiMessage { role: "user", content: &request.question });

        debug!(model = %self.model, messages = messages.len(), "requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ChatApiRequest {
                model: &self.model,
                messages,
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            })
            .send()
            .await
            .map_err(|e| request_error("openai-chat", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(%status, "completion request rejected");
            return Err(status_error("openai-chat", status, detail));
        }

        let parsed: ChatApiResponse = response.json().await.map_err(|e| {
            Error::upstream("openai-chat", format!("failed to parse response: {e}"), false)
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::upstream("openai-chat", "API returned no choices", false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_a_configuration_error() {
        assert!(matches!(OpenAiEmbeddings::new(""), Err(Error::Configuration(_))));
        assert!(matches!(OpenAiChat::new(""), Err(Error::Configuration(_))));
    }

    #[test]
    fn server_errors_and_throttling_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            assert!(
                status_error("openai-chat", status, String::new()).is_transient(),
                "{status} should be transient"
            );
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in
            [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND]
        {
            assert!(
                !status_error("openai-chat", status, String::new()).is_transient(),
                "{status} should be permanent"
            );
        }
    }
}
