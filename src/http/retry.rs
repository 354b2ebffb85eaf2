//! Retry with exponential backoff
//!
//! [`Retrying`] wraps any [`RequestExecutor`] and retries transient
//! failures (rate limit, service unavailable, timeout). Terminal failures
//! are returned on the first attempt.

use super::client::{ApiRequest, ApiResponse, RequestExecutor};
use super::taxonomy::ApiError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{error, warn};

/// Retry budget and backoff shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for a single wait
    pub max_backoff: Duration,
    /// Randomize each wait between half and all of the computed delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set backoff bounds
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Disable jitter (deterministic waits)
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Un-jittered wait before retry number `retry` (0-based)
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        std::cmp::min(
            self.initial_backoff.saturating_mul(factor),
            self.max_backoff,
        )
    }

    /// Wait actually slept before retry number `retry`
    pub fn wait_for(&self, retry: u32) -> Duration {
        let delay = self.calculate_backoff(retry);
        if !self.jitter {
            return delay;
        }
        let half = u64::try_from(delay.as_nanos() / 2).unwrap_or(u64::MAX);
        (delay / 2).saturating_add(Duration::from_nanos(rand::thread_rng().gen_range(0..=half)))
    }

    /// Run `request` through `executor`, retrying transient failures
    pub async fn run<E>(
        &self,
        executor: &E,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ApiError>
    where
        E: RequestExecutor + ?Sized,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match executor.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let wait = self.wait_for(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        path = %request.path,
                        error = %err,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        error!(
                            attempts = attempt,
                            path = %request.path,
                            error = %err,
                            "retry budget exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Executor wrapper applying a [`RetryPolicy`] to every call
#[derive(Debug)]
pub struct Retrying<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: RequestExecutor> Retrying<E> {
    /// Wrap an executor
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped executor
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<E: RequestExecutor> RequestExecutor for Retrying<E> {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.policy.run(&self.inner, request).await
    }
}
