//! HTTP client for the market-data provider.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. The client builds provider URLs, attaches the
//! optional API key and maps HTTP failures onto [`MarketDataError`]. It performs a
//! single attempt per call; retries and rate limiting live in [`crate::fetch`].

mod async_wrapper;
pub use async_wrapper::{AsyncMarketClient, AsyncMarketClientImpl};

use crate::config::Config;
use crate::error::{MarketDataError, MarketDataResult};
use crate::metrics::{HttpTimer, Metrics};
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Path of the coin detail endpoint (identity, price and market data).
pub fn coin_path(token_id: &str) -> String {
    format!(
        "/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
        urlencoding::encode(token_id)
    )
}

/// Path of the historical market chart endpoint, priced in USD.
pub fn market_chart_path(token_id: &str, days: u32) -> String {
    format!(
        "/coins/{}/market_chart?vs_currency=usd&days={}",
        urlencoding::encode(token_id),
        days
    )
}

/// HTTP client for the market-data provider.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct MarketDataClient {
    /// Base URL for the provider API
    base_url: String,

    /// Optional API key
    api_key: Option<String>,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,

    /// Metrics collector
    metrics: Metrics,
}

impl MarketDataClient {
    /// Create a new client from configuration.
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .build();

        Self {
            base_url: config.market_api_url.clone(),
            api_key: config.market_api_key.clone(),
            agent: Arc::new(agent),
            metrics,
        }
    }

    /// Create a client with a custom base URL (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            base_url,
            api_key: None,
            agent: Arc::new(agent),
            metrics: Metrics::new(),
        }
    }

    /// Get a reference to the metrics collector.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Execute a single GET request and parse the body as JSON.
    pub fn get_json(&self, path: &str) -> MarketDataResult<serde_json::Value> {
        let url = self.build_url(path);
        let timer = HttpTimer::new(self.metrics.clone());

        tracing::debug!("GET {}", url);

        let mut request = self.agent.get(&url).set("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set(API_KEY_HEADER, key);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(e) => {
                timer.complete_with_error();
                let error = self.map_error(e);
                tracing::debug!("GET {} - Error: {}", url, error);
                return Err(error);
            }
        };

        let body = match response.into_string() {
            Ok(body) => body,
            Err(e) => {
                timer.complete_with_error();
                return Err(MarketDataError::HttpError(e.to_string()));
            }
        };
        timer.complete();

        serde_json::from_str(&body).map_err(MarketDataError::JsonError)
    }

    /// Map a ureq error to a MarketDataError.
    fn map_error(&self, error: ureq::Error) -> MarketDataError {
        match error {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());

                match code {
                    404 => MarketDataError::NotFound(message),
                    _ => MarketDataError::ApiError {
                        status: code,
                        message,
                    },
                }
            }
            ureq::Error::Transport(transport) => {
                if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                    MarketDataError::HttpError("Connection failed".to_string())
                } else if transport.kind() == ureq::ErrorKind::Io {
                    MarketDataError::Timeout
                } else {
                    MarketDataError::HttpError(transport.to_string())
                }
            }
        }
    }
}
