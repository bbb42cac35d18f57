//! Interval polling tied to a view's lifetime and visibility.

use crate::polling::Query;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Whether the consuming view is currently visible (tab focused).
///
/// Clones share the same signal.
#[derive(Clone)]
pub struct Visibility {
    tx: Arc<watch::Sender<bool>>,
}

impl Visibility {
    pub fn new(visible: bool) -> Self {
        let (tx, _) = watch::channel(visible);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_visible(&self, visible: bool) {
        self.tx.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Owns the timers of a mounted view. Dropping it (or calling `unmount`)
/// aborts them all.
#[derive(Debug, Default)]
pub struct PollHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl PollHandle {
    pub(crate) fn new(tasks: Vec<JoinHandle<()>>) -> Self {
        Self { tasks }
    }

    /// True while any owned task is still running.
    pub fn is_active(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Refetch `query` every `interval` while `visibility` reports visible.
///
/// The first fetch happens immediately. While hidden nothing runs; on becoming
/// visible again an overdue fetch fires at once and the interval restarts from
/// there. If every `Visibility` handle is dropped the view counts as visible.
pub fn spawn_polling<T>(
    query: Query<T>,
    interval: Duration,
    mut visibility: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut watching = true;

        loop {
            if watching && !*visibility.borrow_and_update() {
                tracing::debug!(category = %query.category(), "View hidden, polling paused");
                if visibility.changed().await.is_err() {
                    watching = false;
                }
                continue;
            }

            if watching {
                tokio::select! {
                    _ = ticker.tick() => {
                        query.refetch().await;
                    }
                    changed = visibility.changed() => {
                        if changed.is_err() {
                            watching = false;
                        }
                    }
                }
            } else {
                ticker.tick().await;
                query.refetch().await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarketDataError;
    use crate::models::DataCategory;
    use crate::polling::FetchFn;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_query() -> (Query<u32>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let fetch: FetchFn<u32> = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<u32, MarketDataError>(n) }.boxed()
        });
        (Query::new(DataCategory::Price, 0, fetch), calls)
    }

    #[test]
    fn test_visibility_signal() {
        let visibility = Visibility::default();
        let mut rx = visibility.subscribe();
        assert!(visibility.is_visible());

        visibility.set_visible(true);
        assert!(!rx.has_changed().unwrap());

        visibility.set_visible(false);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let (query, calls) = counting_query();
        let visibility = Visibility::new(true);
        let handle = PollHandle::new(vec![spawn_polling(
            query.clone(),
            Duration::from_secs(30),
            visibility.subscribe(),
        )]);

        tokio::time::sleep(Duration::from_secs(65)).await;
        // t = 0, 30, 60
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(query.state().data, 3);
        assert!(handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_view_does_not_poll() {
        let (query, calls) = counting_query();
        let visibility = Visibility::new(false);
        let _handle = PollHandle::new(vec![spawn_polling(
            query,
            Duration::from_secs(30),
            visibility.subscribe(),
        )]);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        visibility.set_visible(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        visibility.set_visible(false);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_polling() {
        let (query, calls) = counting_query();
        let visibility = Visibility::new(true);
        let handle = PollHandle::new(vec![spawn_polling(
            query,
            Duration::from_secs(30),
            visibility.subscribe(),
        )]);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.unmount();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
