//! Token service layer.
//!
//! Merges the four token data categories into the record the token page shows.

use crate::metrics::Metrics;
use crate::models::{
    CompleteTokenData, DataCategory, TokenChartData, TokenInfo, TokenMetrics, TokenPriceData,
};
use crate::repositories::TokenRepository;
use async_trait::async_trait;
use std::sync::Arc;

/// Token service trait for business operations.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Fetch identity, price, metrics and chart for a token.
    ///
    /// Never fails: every category that cannot be fetched is replaced by its
    /// fallback record. `error` is only set when the request itself is
    /// unusable, in which case every field is a fallback.
    async fn fetch_complete_token_data(&self, token_id: &str) -> CompleteTokenData;
}

/// Default implementation of TokenService.
pub struct TokenServiceImpl {
    repository: Arc<dyn TokenRepository>,
    chart_days: u32,
    metrics: Metrics,
}

/// Validation helper functions.
impl TokenServiceImpl {
    /// Validate token ID format.
    fn validate_token_id(token_id: &str) -> Result<(), String> {
        if token_id.trim().is_empty() {
            return Err("Token ID cannot be empty".to_string());
        }
        if token_id.len() > 100 {
            return Err("Token ID too long".to_string());
        }
        Ok(())
    }
}

impl TokenServiceImpl {
    /// Create a new token service.
    pub fn new(repository: Arc<dyn TokenRepository>, chart_days: u32, metrics: Metrics) -> Self {
        Self {
            repository,
            chart_days,
            metrics,
        }
    }

    fn or_fallback<T>(
        &self,
        token_id: &str,
        category: DataCategory,
        result: crate::error::MarketDataResult<T>,
        fallback: fn() -> T,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.metrics.record_fallback();
                tracing::warn!(
                    token_id = %token_id,
                    category = %category,
                    error = %e,
                    "Substituting fallback value"
                );
                fallback()
            }
        }
    }
}

#[async_trait]
impl TokenService for TokenServiceImpl {
    async fn fetch_complete_token_data(&self, token_id: &str) -> CompleteTokenData {
        if let Err(reason) = Self::validate_token_id(token_id) {
            tracing::warn!(token_id = %token_id, "Rejected token data request: {}", reason);
            return CompleteTokenData::fallback(reason);
        }

        let (token, price, metrics, chart) = futures::join!(
            self.repository.token_info(token_id),
            self.repository.token_price(token_id),
            self.repository.token_metrics(token_id),
            self.repository.token_chart(token_id, self.chart_days),
        );

        CompleteTokenData {
            token: self.or_fallback(token_id, DataCategory::Info, token, TokenInfo::fallback),
            price: self.or_fallback(
                token_id,
                DataCategory::Price,
                price,
                TokenPriceData::fallback,
            ),
            metrics: self.or_fallback(
                token_id,
                DataCategory::Metrics,
                metrics,
                TokenMetrics::fallback,
            ),
            chart: self.or_fallback(
                token_id,
                DataCategory::Chart,
                chart,
                TokenChartData::fallback,
            ),
            error: None,
        }
    }
}
