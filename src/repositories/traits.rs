use crate::error::MarketDataResult;
use crate::models::*;
use async_trait::async_trait;

/// Repository for per-category token data.
///
/// Provides abstraction over how token data is acquired,
/// enabling different implementations (cached provider client, mock).
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Token identity (name, symbol, links).
    async fn token_info(&self, token_id: &str) -> MarketDataResult<TokenInfo>;

    /// Current price and 24h movement.
    async fn token_price(&self, token_id: &str) -> MarketDataResult<TokenPriceData>;

    /// Market capitalisation, volume and supply figures.
    async fn token_metrics(&self, token_id: &str) -> MarketDataResult<TokenMetrics>;

    /// Price history covering the last `days` days.
    async fn token_chart(&self, token_id: &str, days: u32) -> MarketDataResult<TokenChartData>;
}
