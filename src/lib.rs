//! MoonSet market data - remote-data acquisition with layered fallback.
//!
//! This library provides the data layer behind the MoonSet token and portfolio
//! views: rate-limited and retried provider fetches, a shared TTL cache,
//! per-category aggregation that never fails, interval polling tied to view
//! visibility, and the embedded swap widget's load/fallback state machine.
//!
//! # Architecture
//!
//! - **client**: HTTP client for the market-data provider
//! - **fetch**: Sliding-window rate limiter and retrying fetch wrapper
//! - **cache**: Time-based cache with per-entry TTL
//! - **repositories**: Per-category fetch-or-cache token lookups
//! - **services**: Complete token data and portfolio valuation with fallbacks
//! - **polling**: Observable queries and the price polling coordinator
//! - **widget**: Swap widget loading with timeout and external fallback
//! - **context**: Shared wiring of the above
//! - **models**: Token and portfolio records
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod models;
pub mod polling;
pub mod repositories;
pub mod services;
pub mod widget;

// Re-export commonly used types
pub use cache::TimedCache;
pub use client::{AsyncMarketClient, MarketDataClient};
pub use config::Config;
pub use context::MarketDataContext;
pub use error::{
    ConfigError, ConflictingDependency, MarketDataError, MarketDataResult, WidgetLoadError,
};
pub use fetch::{RateLimiter, RetryPolicy, RetryingFetcher};
pub use metrics::{HttpTimer, Metrics, MetricsSummary};
pub use models::{
    CompleteTokenData, DataCategory, Holding, PortfolioValuation, TokenChartData, TokenInfo,
    TokenMetrics, TokenPriceData,
};
pub use polling::{CombinedTokenState, PollHandle, Query, QueryState, TokenQueries, Visibility};
pub use services::{PortfolioService, TokenService};
pub use widget::{WidgetLoadState, WidgetLoader};
