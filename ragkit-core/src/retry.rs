//! Bounded retry with exponential backoff and jitter.
//!
//! Every network-bound call in the pipeline (embedding, index queries,
//! generation) goes through one [`RetryPolicy`] rather than ad-hoc retry
//! loops at each call site. Only failures whose
//! [`is_transient`](crate::Error::is_transient) is true are retried.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

/// A reusable bounded-backoff retry policy.
///
/// Delays double from `base_delay` per attempt, are capped at
/// `max_delay`, and (unless disabled) are jittered uniformly within
/// `[delay/2, delay]` to avoid synchronized retry storms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay, ..Self::default() }
    }

    /// Cap the backoff delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disable jitter, making delays deterministic.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// The total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op`, retrying transient failures until the budget is spent.
    ///
    /// Non-transient errors and the final transient error are returned
    /// to the caller unchanged; wrapping them into a domain error is the
    /// call site's job.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if !err.is_transient() || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Backoff delay before retry number `attempt` (zero-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let capped = exp.min(self.max_delay);
        if !self.jitter {
            return capped;
        }
        let millis = capped.as_millis() as u64;
        if millis == 0 {
            return capped;
        }
        Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
    }
}
