//! Retries with backoff

use crate::client::ClientRequest;
use crate::error::ClientResult;
use crate::handler::{BoxFuture, DelegatingHandler, Next};
use http::StatusCode;
use std::time::Duration;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Same delay every time
    Fixed,
    /// Delay doubles every attempt
    Exponential,
    /// Delay grows by the initial backoff every attempt
    Linear,
}

/// Retry settings
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
    /// Growth of the delay
    pub strategy: RetryStrategy,
    /// Response statuses that trigger a retry
    pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            strategy: RetryStrategy::Exponential,
            retryable_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff;
        let delay = match self.strategy {
            RetryStrategy::Fixed => base,
            RetryStrategy::Exponential => base.saturating_mul(2_u32.saturating_pow(attempt)),
            RetryStrategy::Linear => base.saturating_mul(attempt.saturating_add(1)),
        };
        delay.min(self.max_backoff)
    }

    fn should_retry(&self, result: &ClientResult) -> bool {
        match result {
            Ok(response) => self.retryable_statuses.contains(&response.status()),
            Err(error) => error.is_transient(),
        }
    }
}

/// Re-sends a request on retryable statuses and transient errors
///
/// The last outcome is returned as-is once attempts run out.
#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    /// Default configuration: 3 retries, exponential from 100ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Set the number of retries
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the first delay
    pub fn initial_backoff(mut self, duration: Duration) -> Self {
        self.config.initial_backoff = duration;
        self
    }

    /// Cap every delay
    pub fn max_backoff(mut self, duration: Duration) -> Self {
        self.config.max_backoff = duration;
        self
    }

    /// Set the delay growth
    pub fn strategy(mut self, strategy: RetryStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Replace the retryable statuses
    pub fn retryable_statuses(mut self, statuses: Vec<StatusCode>) -> Self {
        self.config.retryable_statuses = statuses;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

fn duplicate(req: &ClientRequest) -> ClientRequest {
    let mut copy = http::Request::new(req.body().clone());
    *copy.method_mut() = req.method().clone();
    *copy.uri_mut() = req.uri().clone();
    *copy.version_mut() = req.version();
    *copy.headers_mut() = req.headers().clone();
    copy
}

impl DelegatingHandler for RetryHandler {
    fn send(&self, req: ClientRequest, next: Next) -> BoxFuture<ClientResult> {
        let config = self.config.clone();
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let result = next.clone().run(duplicate(&req)).await;
                if attempt >= config.max_attempts || !config.should_retry(&result) {
                    if attempt > 0 {
                        tracing::info!(attempts = attempt + 1, ok = result.is_ok(), "retries finished");
                    }
                    return result;
                }

                let backoff = config.backoff(attempt);
                match &result {
                    Ok(response) => tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        status = response.status().as_u16(),
                        backoff_ms = backoff.as_millis() as u64,
                        "retryable status, retrying"
                    ),
                    Err(error) => tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        error = %error,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient error, retrying"
                    ),
                }
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        })
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}
