//! Observable fetch state for one data category.

use crate::error::MarketDataResult;
use crate::models::DataCategory;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Produces a fresh fetch future on every call.
pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, MarketDataResult<T>> + Send + Sync>;

/// What a view renders for one category.
///
/// `data` always holds something displayable: the fallback until the first
/// successful fetch, then the latest successful result. A failed fetch sets
/// `is_error` without discarding `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: T,
    pub is_loading: bool,
    pub is_error: bool,
    pub error: Option<String>,
}

/// One category's data, refreshed on demand and observable through a watch channel.
///
/// Clones share state. Overlapping `refetch` calls are allowed; whichever
/// resolves last determines `data`.
pub struct Query<T> {
    category: DataCategory,
    fetch: FetchFn<T>,
    state: Arc<watch::Sender<QueryState<T>>>,
    in_flight: Arc<AtomicUsize>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            fetch: self.fetch.clone(),
            state: self.state.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<T> Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(category: DataCategory, fallback: T, fetch: FetchFn<T>) -> Self {
        let (state, _) = watch::channel(QueryState {
            data: fallback,
            is_loading: false,
            is_error: false,
            error: None,
        });

        Self {
            category,
            fetch,
            state: Arc::new(state),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn category(&self) -> DataCategory {
        self.category
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Fetch now and publish the outcome. Returns the state after this call's
    /// result was applied.
    ///
    /// Dropping the returned future mid-fetch (an aborted poll task) still
    /// releases its in-flight slot.
    pub async fn refetch(&self) -> QueryState<T> {
        let guard = InFlightGuard::enter(self.in_flight.clone(), self.state.clone());
        let result = (self.fetch)().await;
        let still_running = guard.complete();

        self.state.send_modify(|state| {
            match result {
                Ok(data) => {
                    state.data = data;
                    state.is_error = false;
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(category = %self.category, error = %e, "Refetch failed");
                    state.is_error = true;
                    state.error = Some(e.to_string());
                }
            }
            state.is_loading = still_running;
        });

        self.state()
    }
}

/// Holds one in-flight slot. Dropped without `complete`, the last slot
/// released clears `is_loading`.
struct InFlightGuard<T> {
    in_flight: Arc<AtomicUsize>,
    state: Arc<watch::Sender<QueryState<T>>>,
    completed: bool,
}

impl<T> InFlightGuard<T> {
    fn enter(in_flight: Arc<AtomicUsize>, state: Arc<watch::Sender<QueryState<T>>>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        state.send_modify(|state| state.is_loading = true);
        Self {
            in_flight,
            state,
            completed: false,
        }
    }

    /// Release the slot, leaving publication to the caller. Returns whether
    /// other refetches are still running.
    fn complete(mut self) -> bool {
        self.completed = true;
        self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1
    }
}

impl<T> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.send_if_modified(|state| {
                let was_loading = state.is_loading;
                state.is_loading = false;
                was_loading
            });
        }
    }
}
