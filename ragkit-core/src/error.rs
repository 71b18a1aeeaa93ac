//! Error types shared across the RagKit workspace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A boxed error used as the `#[source]` cause on wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur anywhere in the pipeline.
///
/// The variants mirror the stable error kinds reported to callers (see
/// [`ErrorKind`]), except [`Error::Upstream`], which is a transport-level
/// failure that the retriever and generator always wrap into
/// [`Error::Retrieval`] or [`Error::Generation`] before it crosses a
/// crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings detected at setup. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A referenced resource (collection, document, file) does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What kind of resource was missing.
        kind: &'static str,
        /// The identifier that failed to resolve.
        name: String,
    },

    /// A vector's dimension does not match the collection it targets.
    ///
    /// Indicates an embedding model or version mismatch. Fatal for the
    /// request, never retried.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the collection was created with.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// Retrieval failed, after the retry budget where the cause was transient.
    #[error("retrieval failed: {message}")]
    Retrieval {
        /// A description of the failure.
        message: String,
        /// The underlying cause, when one exists.
        #[source]
        source: Option<BoxError>,
    },

    /// Generation failed, either permanently or after the retry budget.
    #[error("generation failed: {message}")]
    Generation {
        /// A description of the failure.
        message: String,
        /// The underlying cause, when one exists.
        #[source]
        source: Option<BoxError>,
    },

    /// A transport-level failure from an upstream service.
    #[error("upstream error ({provider}): {message}")]
    Upstream {
        /// The service that produced the failure.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Whether the retry policy may retry the call.
        transient: bool,
    },

    /// The caller aborted the operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build a [`Error::NotFound`] for the given resource kind and name.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound { kind, name: name.into() }
    }

    /// Build a [`Error::Retrieval`] wrapping an underlying cause.
    pub fn retrieval(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Retrieval { message: message.into(), source: Some(source.into()) }
    }

    /// Build a [`Error::Generation`] wrapping an underlying cause.
    pub fn generation(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Generation { message: message.into(), source: Some(source.into()) }
    }

    /// Build a [`Error::Upstream`] with its retry classification.
    pub fn upstream(
        provider: impl Into<String>,
        message: impl Into<String>,
        transient: bool,
    ) -> Self {
        Error::Upstream { provider: provider.into(), message: message.into(), transient }
    }

    /// Whether the retry policy is allowed to retry this failure.
    ///
    /// Only transient upstream failures qualify; every other variant is
    /// surfaced to the caller on first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Upstream { transient: true, .. })
    }

    /// The stable machine-readable kind reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::ConfigurationError,
            Error::NotFound { .. } => ErrorKind::NotFoundError,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatchError,
            // Upstream errors are wrapped before they reach a caller; if
            // one escapes, it reads as a retrieval-side failure.
            Error::Retrieval { .. } | Error::Upstream { .. } => ErrorKind::RetrievalError,
            Error::Generation { .. } => ErrorKind::GenerationError,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The wire form of this error: kind, message, and optional cause.
    pub fn report(&self) -> ErrorReport {
        let cause = std::error::Error::source(self).map(|s| s.to_string());
        ErrorReport { kind: self.kind(), message: self.to_string(), cause }
    }
}

/// Stable error kinds for the transport-agnostic call contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationError,
    NotFoundError,
    DimensionMismatchError,
    RetrievalError,
    GenerationError,
    Cancelled,
}

/// A serializable error as returned over any transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// The stable error kind.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// The rendered underlying cause, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// A convenience result type for RagKit operations.
pub type Result<T> = std::result::Result<T, Error>;
