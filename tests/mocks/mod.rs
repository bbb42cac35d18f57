//! Shared test doubles for the integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_token_repository;
pub mod scripted_market_client;

pub use mock_token_repository::MockTokenRepository;
pub use scripted_market_client::ScriptedMarketClient;
