//! Bounded exponential backoff.
//!
//! Retries transient failures — transport errors, HTTP 429 and 5xx — with a
//! doubling delay, honoring a server-supplied `Retry-After` hint when one is
//! present. Non-retryable failures surface immediately. Once the budget is
//! exhausted, a single aggregated error names the last underlying cause.

use std::future::Future;
use std::time::Duration;

use crate::{Result, UpdaterError};

/// Default maximum number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial backoff delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Outcome of a single attempt, classified by the operation itself.
#[derive(Debug)]
pub enum AttemptError {
    /// Not worth retrying; surfaces immediately.
    Fatal(UpdaterError),
    /// Worth retrying; `retry_after` overrides the computed backoff delay.
    Transient {
        /// The failure that occurred.
        error: UpdaterError,
        /// Server-specified wait hint, if any.
        retry_after: Option<Duration>,
    },
}

impl AttemptError {
    /// A transient failure with no server hint.
    pub fn transient(error: UpdaterError) -> Self {
        Self::Transient {
            error,
            retry_after: None,
        }
    }
}

/// Retry policy with exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry; doubles per subsequent retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Drive `op` until it succeeds, fails fatally, or the budget runs out.
    ///
    /// `context` names the operation in logs and in the aggregated error.
    pub async fn run<T, F, Fut>(&self, context: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(error)) => return Err(error),
                Err(AttemptError::Transient { error, retry_after }) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(UpdaterError::RetriesExhausted {
                            context: context.to_string(),
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }
                    let wait = retry_after.unwrap_or(delay);
                    tracing::warn!(
                        context,
                        attempt,
                        max_retries = self.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
}

/// Classify an HTTP response for retry purposes: 429 and 5xx are transient
/// (with any `Retry-After` hint extracted), everything else passes through.
pub fn check_retryable_status(context: &str, response: &reqwest::Response) -> Option<AttemptError> {
    let status = response.status();
    if status.as_u16() == 429 || status.is_server_error() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Some(AttemptError::Transient {
            error: UpdaterError::HttpStatus {
                context: context.to_string(),
                status: status.as_u16(),
            },
            retry_after,
        });
    }
    None
}
