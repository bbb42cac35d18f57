//! Data models for MoonSet market data.
//!
//! This module contains the value records for token identity, price, metrics and
//! price history, plus the portfolio holdings valued against them.

pub mod portfolio;
pub mod token;

pub use portfolio::{Holding, HoldingValuation, PortfolioValuation};
pub use token::{
    ChartPoint, CompleteTokenData, DataCategory, TokenChartData, TokenInfo, TokenMetrics,
    TokenPriceData,
};
