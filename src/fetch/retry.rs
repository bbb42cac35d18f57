//! Retrying, rate-limited provider fetches.

use crate::client::AsyncMarketClient;
use crate::config::Config;
use crate::error::{MarketDataError, MarketDataResult};
use crate::fetch::RateLimiter;
use crate::metrics::Metrics;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

/// How failed attempts are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one fails
    pub retries: u32,

    /// Attempt `n` (from 0) is followed by a `base_delay * 2^n` pause
    pub base_delay: Duration,

    /// When false, 4xx responses are returned without retrying
    pub retry_client_errors: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retries: config.fetch_retries,
            base_delay: config.retry_base_delay(),
            retry_client_errors: config.retry_client_errors,
        }
    }

    /// Pause after the failed attempt with index `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delays()
            .nth(attempt as usize)
            .unwrap_or(Duration::MAX)
    }

    /// Pauses between attempts, one per allowed retry.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        self.delays().take(self.retries as usize)
    }

    // 2^(n+1) * base / 2, so the first pause is exactly `base_delay`
    fn delays(&self) -> impl Iterator<Item = Duration> {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .map(|delay| delay / 2)
    }

    fn should_retry(&self, error: &MarketDataError) -> bool {
        match error {
            MarketDataError::RateLimitExceeded | MarketDataError::InvalidRequest(_) => false,
            e if e.is_client_error() => self.retry_client_errors,
            _ => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_secs(1),
            retry_client_errors: true,
        }
    }
}

/// Fetch wrapper enforcing the shared request budget and retrying with
/// exponential backoff.
#[derive(Clone)]
pub struct RetryingFetcher {
    client: Arc<dyn AsyncMarketClient>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    metrics: Metrics,
}

impl RetryingFetcher {
    pub fn new(
        client: Arc<dyn AsyncMarketClient>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            limiter,
            policy,
            metrics,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `path` as JSON.
    ///
    /// Every attempt first takes a slot from the rate limiter; an exhausted
    /// budget fails immediately with `RateLimitExceeded` and issues no request.
    /// The slot is taken before the request goes out, so a hanging request
    /// still counts. Failed attempts are retried up to `policy.retries` times,
    /// then the last error is returned.
    pub async fn fetch_with_retry(&self, path: &str) -> MarketDataResult<serde_json::Value> {
        let attempts = AtomicU32::new(0);

        RetryIf::spawn(
            self.policy.strategy(),
            || self.attempt(path, attempts.fetch_add(1, Ordering::SeqCst)),
            |error: &MarketDataError| self.policy.should_retry(error),
        )
        .await
        .map_err(|error| {
            tracing::debug!(
                path = %path,
                attempts = attempts.load(Ordering::SeqCst),
                error = %error,
                "Fetch failed"
            );
            error
        })
    }

    async fn attempt(&self, path: &str, attempt: u32) -> MarketDataResult<serde_json::Value> {
        if attempt > 0 {
            self.metrics.record_retry();
            tracing::warn!(
                path = %path,
                attempt = attempt + 1,
                delay_ms = self.policy.backoff(attempt - 1).as_millis() as u64,
                "Retrying fetch"
            );
        }

        if !self.limiter.try_acquire() {
            self.metrics.record_rate_limited();
            tracing::warn!(
                path = %path,
                retry_in_ms = self.limiter.time_until_available().as_millis() as u64,
                "Rate limit exceeded, request not sent"
            );
            return Err(MarketDataError::RateLimitExceeded);
        }

        self.client.get_json(path).await
    }
}
