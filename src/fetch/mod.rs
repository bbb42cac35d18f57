//! Outbound request plumbing: a shared sliding-window budget and a retrying
//! fetch wrapper built on top of it.

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::RateLimiter;
pub use retry::{RetryPolicy, RetryingFetcher};
