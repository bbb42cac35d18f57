//! Process-wide wiring of the shared cache, rate limiter and repository.
//!
//! Every consumer built from one [`MarketDataContext`] shares the same cache
//! entries and request budget.

use crate::cache::TimedCache;
use crate::client::{AsyncMarketClient, AsyncMarketClientImpl, MarketDataClient};
use crate::config::Config;
use crate::fetch::{RateLimiter, RetryPolicy, RetryingFetcher};
use crate::metrics::Metrics;
use crate::models::DataCategory;
use crate::polling::TokenQueries;
use crate::repositories::{CachedPayload, CachedTokenRepository, TokenRepository};
use crate::services::{PortfolioServiceImpl, TokenServiceImpl};
use crate::widget::{WidgetConfig, WidgetLoader, WidgetModuleLoader};
use std::sync::Arc;

pub struct MarketDataContext {
    config: Config,
    limiter: Arc<RateLimiter>,
    repository: Arc<CachedTokenRepository>,
    metrics: Metrics,
}

impl MarketDataContext {
    /// Build a context talking to the configured provider over HTTP.
    pub fn new(config: &Config) -> Self {
        let metrics = Metrics::new();
        let client = MarketDataClient::new(config, metrics.clone());
        let client = Arc::new(AsyncMarketClientImpl::new(client)) as Arc<dyn AsyncMarketClient>;
        Self::build(config, client, metrics)
    }

    /// Build a context around an existing client.
    pub fn with_client(config: &Config, client: Arc<dyn AsyncMarketClient>) -> Self {
        Self::build(config, client, Metrics::new())
    }

    fn build(config: &Config, client: Arc<dyn AsyncMarketClient>, metrics: Metrics) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
        ));
        let fetcher = RetryingFetcher::new(
            client,
            limiter.clone(),
            RetryPolicy::from_config(config),
            metrics.clone(),
        );
        let cache: TimedCache<String, CachedPayload> = TimedCache::new(DataCategory::Info.ttl());
        let repository = Arc::new(CachedTokenRepository::new(
            fetcher,
            cache,
            metrics.clone(),
        ));

        tracing::debug!(
            max_requests = config.rate_limit_max_requests,
            window_secs = config.rate_limit_window_secs,
            "Market data context initialised"
        );

        Self {
            config: config.clone(),
            limiter,
            repository,
            metrics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cached_repository(&self) -> &Arc<CachedTokenRepository> {
        &self.repository
    }

    pub fn repository(&self) -> Arc<dyn TokenRepository> {
        self.repository.clone()
    }

    pub fn token_service(&self) -> TokenServiceImpl {
        TokenServiceImpl::new(
            self.repository(),
            self.config.chart_days,
            self.metrics.clone(),
        )
    }

    pub fn portfolio_service(&self) -> PortfolioServiceImpl {
        PortfolioServiceImpl::new(self.repository(), self.metrics.clone())
    }

    /// Queries for `token_id`, polled at the configured price interval.
    pub fn token_queries(&self, token_id: &str) -> TokenQueries {
        TokenQueries::new(
            self.repository(),
            token_id,
            self.config.chart_days,
            self.config.price_poll_interval(),
        )
    }

    pub fn widget_loader(&self, loader: Arc<dyn WidgetModuleLoader>) -> WidgetLoader {
        WidgetLoader::new(loader, WidgetConfig::from_config(&self.config))
    }
}
