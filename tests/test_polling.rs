//! Tests for the token queries and the price polling coordinator.

mod mocks;

use futures::FutureExt;
use mocks::MockTokenRepository;
use moonset_data::error::MarketDataError;
use moonset_data::models::{DataCategory, TokenPriceData};
use moonset_data::polling::{spawn_polling, FetchFn, Query, TokenQueries, Visibility};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn queries(repo: &MockTokenRepository) -> TokenQueries {
    TokenQueries::new(
        Arc::new(repo.clone()),
        "moonset",
        7,
        Duration::from_secs(30),
    )
}

#[tokio::test(start_paused = true)]
async fn test_price_polled_while_mounted() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    let queries = queries(&repo);
    let visibility = Visibility::new(true);

    let handle = queries.mount(&visibility);
    tokio::time::sleep(Duration::from_secs(65)).await;

    assert!(repo.get_call_count("token_price") >= 2);
    assert_eq!(queries.price.state().data.current, 0.05);
    // Only price is polled
    assert_eq!(repo.get_call_count("token_info"), 1);
    assert_eq!(repo.get_call_count("token_metrics"), 1);
    assert_eq!(repo.get_call_count("token_chart"), 1);

    handle.unmount();
    let polled = repo.get_call_count("token_price");
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(repo.get_call_count("token_price"), polled);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    let queries = queries(&repo);
    let visibility = Visibility::new(true);

    {
        let _handle = queries.mount(&visibility);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    let polled = repo.get_call_count("token_price");
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(repo.get_call_count("token_price"), polled);
}

#[tokio::test(start_paused = true)]
async fn test_background_tab_pauses_polling() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    let queries = queries(&repo);
    let visibility = Visibility::new(true);
    let _handle = queries.mount(&visibility);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(repo.get_call_count("token_price"), 1);

    visibility.set_visible(false);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(repo.get_call_count("token_price"), 1);

    // Coming back fetches straight away
    visibility.set_visible(true);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(repo.get_call_count("token_price"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_keeps_last_price() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    let queries = queries(&repo);
    let visibility = Visibility::new(true);
    let _handle = queries.mount(&visibility);

    tokio::time::sleep(Duration::from_secs(1)).await;
    repo.set_failing(DataCategory::Price, true);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let state = queries.price.state();
    assert!(state.is_error);
    assert!(state.error.is_some());
    assert_eq!(state.data.current, 0.05);

    let combined = queries.combined();
    assert!(combined.is_error);
    assert_eq!(combined.data.price.current, 0.05);
    assert!(combined.data.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_manual_refetch_alongside_polling() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    let queries = queries(&repo);
    let visibility = Visibility::new(true);
    let _handle = queries.mount(&visibility);

    tokio::time::sleep(Duration::from_secs(1)).await;
    repo.set_price("moonset", 0.06);

    let state = queries.price.refetch().await;
    assert_eq!(state.data.current, 0.06);
    let again = queries.price.refetch().await;
    assert_eq!(again.data, state.data);
    assert!(!again.is_loading);
}

#[tokio::test]
async fn test_unmounted_queries_show_fallbacks() {
    let repo = MockTokenRepository::new();
    let queries = queries(&repo);

    let combined = queries.combined();
    assert_eq!(combined.data.price, TokenPriceData::fallback());
    assert!(!combined.is_loading);
    assert!(!combined.is_error);
    assert_eq!(repo.get_call_count("token_price"), 0);
}

#[tokio::test]
async fn test_refetch_all() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    repo.set_failing(DataCategory::Chart, true);
    let queries = queries(&repo);

    let combined = queries.refetch_all().await;

    assert_eq!(combined.data.price.current, 0.05);
    assert_eq!(combined.data.token.symbol, "MSET");
    assert!(combined.data.chart.is_empty());
    assert!(combined.is_error);
    assert!(queries.chart.state().is_error);
    assert!(!queries.price.state().is_error);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_during_slow_fetch_clears_loading() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let fetch: FetchFn<u32> = Arc::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<u32, MarketDataError>(n)
        }
        .boxed()
    });
    let query = Query::new(DataCategory::Price, 0, fetch);
    let visibility = Visibility::new(true);

    let task = spawn_polling(query.clone(), Duration::from_secs(30), visibility.subscribe());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(query.state().is_loading);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let state = query.state();
    assert_eq!(state.data, 0);
    assert!(!state.is_loading);

    let state = query.refetch().await;
    assert_eq!(state.data, 2);
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_remount_after_interrupted_fetch_settles() {
    let repo = MockTokenRepository::new();
    repo.set_price("moonset", 0.05);
    repo.set_latency(Duration::from_secs(5));
    let queries = queries(&repo);
    let visibility = Visibility::new(true);

    let handle = queries.mount(&visibility);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(queries.combined().is_loading);

    handle.unmount();
    // Let the runtime drop the aborted tasks
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!queries.combined().is_loading);

    repo.set_latency(Duration::ZERO);
    let combined = queries.refetch_all().await;
    assert!(!combined.is_loading);
    assert_eq!(combined.data.price.current, 0.05);

    let handle = queries.mount(&visibility);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!queries.combined().is_loading);
    handle.unmount();
}
