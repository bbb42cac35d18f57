//! MoonSet market data - command line driver
//!
//! Prints the complete token record as JSON. With `--watch`, keeps polling the
//! price and logs every update until interrupted.

use anyhow::Result;
use clap::Parser;
use moonset_data::polling::Visibility;
use moonset_data::services::TokenService;
use moonset_data::{Config, MarketDataContext};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "moonset-data")]
#[command(about = "Fetch complete MoonSet token data, optionally polling the price")]
struct Args {
    /// Provider token id (defaults to MOONSET_TOKEN_ID)
    token_id: Option<String>,

    /// Keep polling the price until Ctrl-C
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration before logging so LOG_LEVEL can seed the filter
    let config = Config::from_env();
    let default_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging (stderr only so stdout stays machine-readable)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let token_id = args.token_id.unwrap_or_else(|| config.token_id.clone());

    info!("Fetching {} from {}", token_id, config.market_api_url);

    let context = MarketDataContext::new(&config);
    let data = context
        .token_service()
        .fetch_complete_token_data(&token_id)
        .await;
    println!("{}", serde_json::to_string_pretty(&data)?);

    if args.watch {
        watch_price(&context, &token_id).await?;
    }

    let summary = context.metrics().summary();
    info!(
        requests = summary.http_requests_total,
        errors = summary.http_errors_total,
        retries = summary.retries_total,
        rate_limited = summary.rate_limited_total,
        cache_hits = summary.cache_hits_total,
        cache_misses = summary.cache_misses_total,
        fallbacks = summary.fallbacks_total,
        "Metrics summary"
    );

    Ok(())
}

async fn watch_price(context: &MarketDataContext, token_id: &str) -> Result<()> {
    let queries = context.token_queries(token_id);
    let visibility = Visibility::new(true);
    let mut updates = queries.price.subscribe();
    let handle = queries.mount(&visibility);

    info!(
        "Polling price every {}s, press Ctrl-C to stop",
        context.config().price_poll_interval_secs
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.is_loading {
                    continue;
                }
                if state.is_error {
                    error!(
                        error = state.error.as_deref().unwrap_or("unknown"),
                        "Price refresh failed, showing last known price"
                    );
                }
                info!(
                    price = state.data.current,
                    change_24h_percent = state.data.change_24h_percent,
                    "Price update"
                );
            }
            _ = &mut ctrl_c => {
                info!("Stopping price polling");
                break;
            }
        }
    }

    handle.unmount();
    Ok(())
}
