//! Portfolio service layer.
//!
//! Values the user's holdings at current prices.

use crate::metrics::Metrics;
use crate::models::{Holding, HoldingValuation, PortfolioValuation};
use crate::repositories::TokenRepository;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Portfolio service trait for business operations.
#[async_trait]
pub trait PortfolioService: Send + Sync {
    /// Price every holding concurrently and total the result.
    ///
    /// A holding whose price cannot be fetched is valued at zero and marks the
    /// valuation stale; the call itself never fails.
    async fn value_holdings(&self, holdings: &[Holding]) -> PortfolioValuation;
}

/// Default implementation of PortfolioService.
pub struct PortfolioServiceImpl {
    repository: Arc<dyn TokenRepository>,
    metrics: Metrics,
}

impl PortfolioServiceImpl {
    /// Create a new portfolio service.
    pub fn new(repository: Arc<dyn TokenRepository>, metrics: Metrics) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    async fn value_holding(&self, holding: &Holding) -> HoldingValuation {
        match self.repository.token_price(&holding.token_id).await {
            Ok(price) => HoldingValuation {
                token_id: holding.token_id.clone(),
                amount: holding.amount,
                price: price.current,
                value_usd: holding.amount * price.current,
                change_24h_usd: holding.amount * price.change_24h,
                price_available: true,
            },
            Err(e) => {
                self.metrics.record_fallback();
                tracing::warn!(
                    token_id = %holding.token_id,
                    error = %e,
                    "Price unavailable, valuing holding at zero"
                );
                HoldingValuation {
                    token_id: holding.token_id.clone(),
                    amount: holding.amount,
                    price: 0.0,
                    value_usd: 0.0,
                    change_24h_usd: 0.0,
                    price_available: false,
                }
            }
        }
    }
}

#[async_trait]
impl PortfolioService for PortfolioServiceImpl {
    async fn value_holdings(&self, holdings: &[Holding]) -> PortfolioValuation {
        let valued = join_all(holdings.iter().map(|h| self.value_holding(h))).await;
        PortfolioValuation::from_holdings(valued)
    }
}
