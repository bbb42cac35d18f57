//! Async wrapper around the synchronous MarketDataClient.
//!
//! This module provides an async interface to the synchronous client by using
//! `tokio::task::spawn_blocking` to run HTTP operations on a dedicated thread pool,
//! preventing blocking of the async runtime.

use crate::client::MarketDataClient;
use crate::error::{MarketDataError, MarketDataResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Async seam for single-attempt provider requests.
///
/// The retrying fetcher is written against this trait so tests can drive it
/// with scripted responses.
#[async_trait]
pub trait AsyncMarketClient: Send + Sync {
    /// Issue one GET request and return the parsed JSON body.
    async fn get_json(&self, path: &str) -> MarketDataResult<serde_json::Value>;
}

/// Async wrapper around synchronous MarketDataClient.
#[derive(Clone)]
pub struct AsyncMarketClientImpl {
    client: Arc<MarketDataClient>,
}

impl AsyncMarketClientImpl {
    pub fn new(client: MarketDataClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl AsyncMarketClient for AsyncMarketClientImpl {
    async fn get_json(&self, path: &str) -> MarketDataResult<serde_json::Value> {
        let client = self.client.clone();
        let path = path.to_string();

        tokio::task::spawn_blocking(move || client.get_json(&path))
            .await
            .map_err(|e| MarketDataError::HttpError(format!("Task join error: {}", e)))?
    }
}
