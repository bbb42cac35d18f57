//! Observable per-category queries and the polling that keeps them fresh.
//!
//! A [`Query`] publishes its state through a `tokio::sync::watch` channel. The
//! coordinator refetches price on an interval while the view is visible, and a
//! [`PollHandle`] ties the timers to the view's lifetime.

mod coordinator;
mod query;
mod token_queries;

pub use coordinator::{spawn_polling, PollHandle, Visibility};
pub use query::{FetchFn, Query, QueryState};
pub use token_queries::{CombinedTokenState, TokenQueries};
