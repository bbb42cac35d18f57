//! Configuration management for the MoonSet market-data core.
//!
//! This module handles loading and validating configuration from environment variables,
//! reading a `.env` file first when one is present.

use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::time::Duration;

const DEFAULT_MARKET_API_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_EXTERNAL_SWAP_URL: &str = "https://app.uniswap.org/swap";

/// Configuration for the market-data core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Market-data provider base URL
    pub market_api_url: String,

    /// Optional provider API key
    pub market_api_key: Option<String>,

    /// Token identifier used by the binary (default: "moonset")
    pub token_id: String,

    /// HTTP request timeout in seconds (default: 10)
    pub request_timeout: u64,

    /// Requests allowed per rate-limit window (default: 50)
    pub rate_limit_max_requests: usize,

    /// Rate-limit window length in seconds (default: 60)
    pub rate_limit_window_secs: u64,

    /// Additional attempts after the first failed fetch (default: 2)
    pub fetch_retries: u32,

    /// Backoff base in milliseconds; attempt `n` waits `base * 2^n` (default: 1000)
    pub retry_base_delay_ms: u64,

    /// Whether 4xx responses are retried like any other failure (default: true)
    pub retry_client_errors: bool,

    /// Price polling interval in seconds (default: 30)
    pub price_poll_interval_secs: u64,

    /// Days of history requested for the chart (default: 7)
    pub chart_days: u32,

    /// Embedded widget load timeout in seconds (default: 10)
    pub widget_load_timeout_secs: u64,

    /// Delay before a failed widget load falls back automatically (default: 2)
    pub widget_fallback_delay_secs: u64,

    /// External trading platform used by the fallback path
    pub external_swap_url: String,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional:
    /// - `MOONSET_MARKET_API_URL`: provider base URL (default: CoinGecko v3)
    /// - `MOONSET_MARKET_API_KEY`: provider API key
    /// - `MOONSET_TOKEN_ID`: token to load (default: "moonset")
    /// - `REQUEST_TIMEOUT`: HTTP timeout in seconds (default: 10)
    /// - `MOONSET_RATE_LIMIT_MAX_REQUESTS` / `MOONSET_RATE_LIMIT_WINDOW_SECS` (default: 50 per 60s)
    /// - `MOONSET_FETCH_RETRIES`, `MOONSET_RETRY_BASE_DELAY_MS`, `MOONSET_RETRY_CLIENT_ERRORS`
    /// - `MOONSET_PRICE_POLL_INTERVAL_SECS` (default: 30)
    /// - `MOONSET_CHART_DAYS` (default: 7)
    /// - `MOONSET_WIDGET_LOAD_TIMEOUT_SECS`, `MOONSET_WIDGET_FALLBACK_DELAY_SECS` (default: 10, 2)
    /// - `MOONSET_EXTERNAL_SWAP_URL`
    /// - `LOG_LEVEL`: logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Missing .env is not an error
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let market_api_url =
            env::var("MOONSET_MARKET_API_URL").unwrap_or(defaults.market_api_url);
        Self::validate_url("MOONSET_MARKET_API_URL", &market_api_url)?;

        let market_api_key = env::var("MOONSET_MARKET_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let token_id = env::var("MOONSET_TOKEN_ID").unwrap_or(defaults.token_id);
        if token_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "MOONSET_TOKEN_ID".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", defaults.request_timeout)?;
        let rate_limit_max_requests = Self::parse_env_usize(
            "MOONSET_RATE_LIMIT_MAX_REQUESTS",
            defaults.rate_limit_max_requests,
        )?;
        let rate_limit_window_secs = Self::parse_env_u64(
            "MOONSET_RATE_LIMIT_WINDOW_SECS",
            defaults.rate_limit_window_secs,
        )?;
        let fetch_retries =
            Self::parse_env_u64("MOONSET_FETCH_RETRIES", defaults.fetch_retries as u64)?;
        let fetch_retries = u32::try_from(fetch_retries).map_err(|_| ConfigError::InvalidValue {
            var: "MOONSET_FETCH_RETRIES".to_string(),
            reason: format!("Too large: {}", fetch_retries),
        })?;
        let retry_base_delay_ms =
            Self::parse_env_u64("MOONSET_RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms)?;
        let retry_client_errors =
            Self::parse_env_bool("MOONSET_RETRY_CLIENT_ERRORS", defaults.retry_client_errors)?;
        let price_poll_interval_secs = Self::parse_env_u64(
            "MOONSET_PRICE_POLL_INTERVAL_SECS",
            defaults.price_poll_interval_secs,
        )?;
        let chart_days = Self::parse_env_u64("MOONSET_CHART_DAYS", defaults.chart_days as u64)?;
        let widget_load_timeout_secs = Self::parse_env_u64(
            "MOONSET_WIDGET_LOAD_TIMEOUT_SECS",
            defaults.widget_load_timeout_secs,
        )?;
        let widget_fallback_delay_secs = Self::parse_env_u64(
            "MOONSET_WIDGET_FALLBACK_DELAY_SECS",
            defaults.widget_fallback_delay_secs,
        )?;

        for (var, value) in [
            ("MOONSET_RATE_LIMIT_MAX_REQUESTS", rate_limit_max_requests as u64),
            ("MOONSET_RATE_LIMIT_WINDOW_SECS", rate_limit_window_secs),
            ("MOONSET_PRICE_POLL_INTERVAL_SECS", price_poll_interval_secs),
            ("MOONSET_CHART_DAYS", chart_days),
            ("MOONSET_WIDGET_LOAD_TIMEOUT_SECS", widget_load_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    var: var.to_string(),
                    reason: "Must be greater than zero".to_string(),
                });
            }
        }

        let chart_days = u32::try_from(chart_days).map_err(|_| ConfigError::InvalidValue {
            var: "MOONSET_CHART_DAYS".to_string(),
            reason: format!("Too large: {}", chart_days),
        })?;

        let external_swap_url =
            env::var("MOONSET_EXTERNAL_SWAP_URL").unwrap_or(defaults.external_swap_url);
        Self::validate_url("MOONSET_EXTERNAL_SWAP_URL", &external_swap_url)?;

        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Config {
            market_api_url,
            market_api_key,
            token_id,
            request_timeout,
            rate_limit_max_requests,
            rate_limit_window_secs,
            fetch_retries,
            retry_base_delay_ms,
            retry_client_errors,
            price_poll_interval_secs,
            chart_days,
            widget_load_timeout_secs,
            widget_fallback_delay_secs,
            external_swap_url,
            log_level,
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn price_poll_interval(&self) -> Duration {
        Duration::from_secs(self.price_poll_interval_secs)
    }

    pub fn widget_load_timeout(&self) -> Duration {
        Duration::from_secs(self.widget_load_timeout_secs)
    }

    pub fn widget_fallback_delay(&self) -> Duration {
        Duration::from_secs(self.widget_fallback_delay_secs)
    }

    fn validate_url(var_name: &str, url: &str) -> ConfigResult<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as a boolean with a default value.
    fn parse_env_bool(var_name: &str, default: bool) -> ConfigResult<bool> {
        match env::var(var_name) {
            Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    var: var_name.to_string(),
                    reason: format!("Must be true or false, got: {}", val),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            market_api_url: DEFAULT_MARKET_API_URL.to_string(),
            market_api_key: None,
            token_id: "moonset".to_string(),
            request_timeout: 10,
            rate_limit_max_requests: 50,
            rate_limit_window_secs: 60,
            fetch_retries: 2,
            retry_base_delay_ms: 1000,
            retry_client_errors: true,
            price_poll_interval_secs: 30,
            chart_days: 7,
            widget_load_timeout_secs: 10,
            widget_fallback_delay_secs: 2,
            external_swap_url: DEFAULT_EXTERNAL_SWAP_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}
