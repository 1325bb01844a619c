//! Bounded exponential backoff for transient upstream failures.

use crate::error::{CatalogError, Result};
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Only
    /// [`CatalogError::Transient`] failures are retried; after the last
    /// attempt they are reported as [`CatalogError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(CatalogError::Transient { message }) => {
                    if attempt >= self.max_attempts {
                        tracing::error!(
                            "Upstream request failed after {} attempts: {}",
                            attempt,
                            message
                        );
                        return Err(CatalogError::RetriesExhausted {
                            attempts: attempt,
                            last: message,
                        });
                    }

                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "Upstream request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_attempts,
                        delay,
                        message
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2000))
    }
}
