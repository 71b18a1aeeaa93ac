//! Cooperative cancellation for in-flight pipeline work.
//!
//! A caller holds a [`CancellationSource`] and hands
//! [`CancellationToken`]s to the pipeline. Cancelling the source aborts
//! any stage currently racing a network call via
//! [`CancellationToken::guard`].

use std::future::Future;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Hands out tokens and flips them to cancelled.
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    /// Create a new, not-yet-cancelled source.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Issue a token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken { rx: Some(self.tx.subscribe()) }
    }

    /// Request cancellation. All outstanding tokens fire.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// An observer of one [`CancellationSource`].
///
/// Dropping the source counts as cancellation: work whose owner has gone
/// away has no one left to consume its result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationToken {
    /// A token that never fires, for callers without a cancellation path.
    pub fn none() -> Self {
        Self { rx: None }
    }

    /// Whether cancellation has already been requested.
    pub fn is_cancelled(&self) -> bool {
        match &self.rx {
            None => false,
            Some(rx) => *rx.borrow(),
        }
    }

    /// Resolves once cancellation is requested. Pends forever for
    /// [`CancellationToken::none`].
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        // Source dropped without an explicit cancel.
    }

    /// Race `fut` against cancellation, returning [`Error::Cancelled`]
    /// if the token fires first.
    pub async fn guard<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}
