//! Repository layer for token market data.
//!
//! The trait hides where data comes from; the provided implementation layers the
//! shared cache over the rate-limited, retrying provider fetcher.

pub mod cached_token_repository;
pub mod traits;

pub use cached_token_repository::{CachedPayload, CachedTokenRepository};
pub use traits::TokenRepository;
