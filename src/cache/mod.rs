//! Caching utilities for the market-data core.
//!
//! This module provides a generic time-based cache with per-entry TTL support.

pub mod timed_cache;

pub use timed_cache::TimedCache;
