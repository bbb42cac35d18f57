//! The four per-category queries a token page subscribes to.

use crate::models::{
    CompleteTokenData, DataCategory, TokenChartData, TokenInfo, TokenMetrics, TokenPriceData,
};
use crate::polling::{spawn_polling, FetchFn, PollHandle, Query, Visibility};
use crate::repositories::TokenRepository;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Merged view over all four queries.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTokenState {
    pub data: CompleteTokenData,
    /// Any category is loading
    pub is_loading: bool,
    /// Any category's latest fetch failed
    pub is_error: bool,
}

/// Per-category queries for one token.
///
/// Only price is polled; identity, metrics and chart are fetched once on
/// mount and then on explicit `refetch_all`.
#[derive(Clone)]
pub struct TokenQueries {
    token_id: String,
    poll_interval: Duration,
    pub info: Query<TokenInfo>,
    pub price: Query<TokenPriceData>,
    pub metrics: Query<TokenMetrics>,
    pub chart: Query<TokenChartData>,
}

impl TokenQueries {
    pub fn new(
        repository: Arc<dyn TokenRepository>,
        token_id: impl Into<String>,
        chart_days: u32,
        poll_interval: Duration,
    ) -> Self {
        let token_id = token_id.into();

        let info: FetchFn<TokenInfo> = {
            let repo = repository.clone();
            let id = token_id.clone();
            Arc::new(move || {
                let repo = repo.clone();
                let id = id.clone();
                async move { repo.token_info(&id).await }.boxed()
            })
        };
        let price: FetchFn<TokenPriceData> = {
            let repo = repository.clone();
            let id = token_id.clone();
            Arc::new(move || {
                let repo = repo.clone();
                let id = id.clone();
                async move { repo.token_price(&id).await }.boxed()
            })
        };
        let metrics: FetchFn<TokenMetrics> = {
            let repo = repository.clone();
            let id = token_id.clone();
            Arc::new(move || {
                let repo = repo.clone();
                let id = id.clone();
                async move { repo.token_metrics(&id).await }.boxed()
            })
        };
        let chart: FetchFn<TokenChartData> = {
            let repo = repository;
            let id = token_id.clone();
            Arc::new(move || {
                let repo = repo.clone();
                let id = id.clone();
                async move { repo.token_chart(&id, chart_days).await }.boxed()
            })
        };

        Self {
            token_id,
            poll_interval,
            info: Query::new(DataCategory::Info, TokenInfo::fallback(), info),
            price: Query::new(DataCategory::Price, TokenPriceData::fallback(), price),
            metrics: Query::new(DataCategory::Metrics, TokenMetrics::fallback(), metrics),
            chart: Query::new(DataCategory::Chart, TokenChartData::fallback(), chart),
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// Start the view: poll price while visible and fetch the other categories once.
    ///
    /// Everything stops when the returned handle is dropped.
    pub fn mount(&self, visibility: &Visibility) -> PollHandle {
        tracing::debug!(
            token_id = %self.token_id,
            interval_secs = self.poll_interval.as_secs(),
            "Mounting token queries"
        );

        let poller = spawn_polling(
            self.price.clone(),
            self.poll_interval,
            visibility.subscribe(),
        );

        let info = self.info.clone();
        let metrics = self.metrics.clone();
        let chart = self.chart.clone();
        let initial = tokio::spawn(async move {
            futures::join!(info.refetch(), metrics.refetch(), chart.refetch());
        });

        PollHandle::new(vec![poller, initial])
    }

    /// Refetch every category concurrently.
    pub async fn refetch_all(&self) -> CombinedTokenState {
        futures::join!(
            self.info.refetch(),
            self.price.refetch(),
            self.metrics.refetch(),
            self.chart.refetch(),
        );
        self.combined()
    }

    pub fn combined(&self) -> CombinedTokenState {
        let info = self.info.state();
        let price = self.price.state();
        let metrics = self.metrics.state();
        let chart = self.chart.state();

        CombinedTokenState {
            is_loading: info.is_loading
                || price.is_loading
                || metrics.is_loading
                || chart.is_loading,
            is_error: info.is_error || price.is_error || metrics.is_error || chart.is_error,
            data: CompleteTokenData {
                token: info.data,
                price: price.data,
                metrics: metrics.data,
                chart: chart.data,
                error: None,
            },
        }
    }
}
