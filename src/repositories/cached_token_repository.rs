use crate::cache::TimedCache;
use crate::client::{coin_path, market_chart_path};
use crate::error::{MarketDataError, MarketDataResult};
use crate::fetch::RetryingFetcher;
use crate::metrics::Metrics;
use crate::models::*;
use crate::repositories::traits::TokenRepository;
use async_trait::async_trait;
use std::future::Future;

/// A formatted record as held in the shared cache.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Info(TokenInfo),
    Price(TokenPriceData),
    Metrics(TokenMetrics),
    Chart(TokenChartData),
}

/// Records that can live in the shared cache under their category's TTL.
trait Cacheable: Clone + Sized {
    const CATEGORY: DataCategory;
    fn into_cached(self) -> CachedPayload;
    fn from_cached(payload: CachedPayload) -> Option<Self>;
}

impl Cacheable for TokenInfo {
    const CATEGORY: DataCategory = DataCategory::Info;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Info(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Info(info) => Some(info),
            _ => None,
        }
    }
}

impl Cacheable for TokenPriceData {
    const CATEGORY: DataCategory = DataCategory::Price;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Price(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Price(price) => Some(price),
            _ => None,
        }
    }
}

impl Cacheable for TokenMetrics {
    const CATEGORY: DataCategory = DataCategory::Metrics;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Metrics(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Metrics(metrics) => Some(metrics),
            _ => None,
        }
    }
}

impl Cacheable for TokenChartData {
    const CATEGORY: DataCategory = DataCategory::Chart;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Chart(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Chart(chart) => Some(chart),
            _ => None,
        }
    }
}

/// Token repository backed by the shared cache and the retrying fetcher.
///
/// A lookup is served from the cache while the entry is fresh; on a miss the
/// provider is queried, the payload formatted and the result stored under the
/// category's TTL. Errors are returned as-is, never cached.
pub struct CachedTokenRepository {
    fetcher: RetryingFetcher,
    cache: TimedCache<String, CachedPayload>,
    metrics: Metrics,
}

impl CachedTokenRepository {
    pub fn new(
        fetcher: RetryingFetcher,
        cache: TimedCache<String, CachedPayload>,
        metrics: Metrics,
    ) -> Self {
        Self {
            fetcher,
            cache,
            metrics,
        }
    }

    pub fn cache(&self) -> &TimedCache<String, CachedPayload> {
        &self.cache
    }

    /// Drop every cached category for a token.
    pub fn invalidate(&self, token_id: &str) {
        for category in DataCategory::ALL {
            self.cache.remove(&category.cache_key(token_id));
        }
        let chart_prefix = format!("{}:", DataCategory::Chart.cache_key(token_id));
        self.cache.remove_where(|key| key.starts_with(&chart_prefix));
    }

    fn validate_token_id(token_id: &str) -> MarketDataResult<()> {
        if token_id.trim().is_empty() {
            return Err(MarketDataError::InvalidRequest(
                "Token ID cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    async fn cached<T, F, Fut>(&self, key: String, fetch: F) -> MarketDataResult<T>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = MarketDataResult<T>>,
    {
        if let Some((value, age)) = self
            .cache
            .get_with_age(&key)
            .and_then(|(cached, age)| T::from_cached(cached).map(|value| (value, age)))
        {
            self.metrics.record_cache_access(T::CATEGORY.as_str(), true);
            tracing::debug!(key = %key, age_ms = age.as_millis() as u64, "Serving from cache");
            return Ok(value);
        }
        self.metrics.record_cache_access(T::CATEGORY.as_str(), false);

        let value = fetch().await?;
        self.cache
            .insert_with_ttl(key, value.clone().into_cached(), T::CATEGORY.ttl());
        Ok(value)
    }

    async fn fetch_coin(&self, token_id: &str) -> MarketDataResult<serde_json::Value> {
        self.fetcher.fetch_with_retry(&coin_path(token_id)).await
    }
}

#[async_trait]
impl TokenRepository for CachedTokenRepository {
    async fn token_info(&self, token_id: &str) -> MarketDataResult<TokenInfo> {
        Self::validate_token_id(token_id)?;
        self.cached(DataCategory::Info.cache_key(token_id), || async {
            let raw = self.fetch_coin(token_id).await?;
            Ok(TokenInfo::from_payload(&raw, token_id))
        })
        .await
    }

    async fn token_price(&self, token_id: &str) -> MarketDataResult<TokenPriceData> {
        Self::validate_token_id(token_id)?;
        self.cached(DataCategory::Price.cache_key(token_id), || async {
            let raw = self.fetch_coin(token_id).await?;
            TokenPriceData::from_payload(&raw)
        })
        .await
    }

    async fn token_metrics(&self, token_id: &str) -> MarketDataResult<TokenMetrics> {
        Self::validate_token_id(token_id)?;
        self.cached(DataCategory::Metrics.cache_key(token_id), || async {
            let raw = self.fetch_coin(token_id).await?;
            Ok(TokenMetrics::from_payload(&raw))
        })
        .await
    }

    async fn token_chart(&self, token_id: &str, days: u32) -> MarketDataResult<TokenChartData> {
        Self::validate_token_id(token_id)?;
        let key = format!("{}:{}", DataCategory::Chart.cache_key(token_id), days);
        self.cached(key, || async {
            let raw = self
                .fetcher
                .fetch_with_retry(&market_chart_path(token_id, days))
                .await?;
            TokenChartData::from_payload(&raw)
        })
        .await
    }
}
