use async_trait::async_trait;
use moonset_data::error::{MarketDataError, MarketDataResult};
use moonset_data::models::{
    DataCategory, TokenChartData, TokenInfo, TokenMetrics, TokenPriceData,
};
use moonset_data::repositories::TokenRepository;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock token repository for testing.
///
/// Serves in-memory per-token prices and tracks method calls for
/// verification. Individual categories can be switched to fail.
#[derive(Clone, Default)]
pub struct MockTokenRepository {
    prices: Arc<Mutex<HashMap<String, f64>>>,
    failing: Arc<Mutex<HashSet<DataCategory>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    latency: Arc<Mutex<Duration>>,
}

impl MockTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price served for a token.
    pub fn set_price(&self, token_id: &str, price: f64) {
        self.prices
            .lock()
            .unwrap()
            .insert(token_id.to_string(), price);
    }

    /// Make every lookup of `category` fail (or succeed again).
    pub fn set_failing(&self, category: DataCategory, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(category);
        } else {
            set.remove(&category);
        }
    }

    /// Delay every lookup by `latency` (on the tokio clock).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    pub fn reset_call_counts(&self) {
        self.call_counts.lock().unwrap().clear();
    }

    async fn track_call(&self, method: &str) {
        {
            let mut counts = self.call_counts.lock().unwrap();
            *counts.entry(method.to_string()).or_insert(0) += 1;
        }
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self, category: DataCategory) -> MarketDataResult<()> {
        if self.failing.lock().unwrap().contains(&category) {
            return Err(MarketDataError::ApiError {
                status: 503,
                message: format!("{} unavailable", category),
            });
        }
        Ok(())
    }

    fn price_of(&self, token_id: &str) -> MarketDataResult<f64> {
        self.prices
            .lock()
            .unwrap()
            .get(token_id)
            .copied()
            .ok_or_else(|| MarketDataError::NotFound(format!("Token {}", token_id)))
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn token_info(&self, token_id: &str) -> MarketDataResult<TokenInfo> {
        self.track_call("token_info").await;
        self.check(DataCategory::Info)?;
        Ok(TokenInfo {
            id: token_id.to_string(),
            name: "MoonSet".to_string(),
            symbol: "MSET".to_string(),
            ..TokenInfo::fallback()
        })
    }

    async fn token_price(&self, token_id: &str) -> MarketDataResult<TokenPriceData> {
        self.track_call("token_price").await;
        self.check(DataCategory::Price)?;
        let current = self.price_of(token_id)?;
        Ok(TokenPriceData {
            current,
            change_24h: current * 0.1,
            change_24h_percent: 10.0,
            ..TokenPriceData::fallback()
        })
    }

    async fn token_metrics(&self, token_id: &str) -> MarketDataResult<TokenMetrics> {
        self.track_call("token_metrics").await;
        self.check(DataCategory::Metrics)?;
        let price = self.price_of(token_id)?;
        Ok(TokenMetrics {
            market_cap: Some(price * 1_000_000.0),
            ..TokenMetrics::default()
        })
    }

    async fn token_chart(&self, token_id: &str, _days: u32) -> MarketDataResult<TokenChartData> {
        self.track_call("token_chart").await;
        self.check(DataCategory::Chart)?;
        self.price_of(token_id)?;
        Ok(TokenChartData::fallback())
    }
}
