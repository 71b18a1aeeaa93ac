//! Shared foundation for the RagKit workspace.
//!
//! This crate holds the pieces every other RagKit crate builds on:
//!
//! - [`Error`] / [`Result`] — the workspace-wide error taxonomy
//! - [`RetryPolicy`] — bounded exponential backoff for network-bound calls
//! - [`CancellationSource`] / [`CancellationToken`] — cooperative abort
//! - [`ConversationTurn`] / [`Role`] — the conversation data model

pub mod cancel;
pub mod conversation;
pub mod error;
pub mod retry;

pub use cancel::{CancellationSource, CancellationToken};
pub use conversation::{ConversationTurn, Role};
pub use error::{BoxError, Error, ErrorKind, ErrorReport, Result};
pub use retry::RetryPolicy;
