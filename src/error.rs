//! Error types for the MoonSet market-data core.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when acquiring data from the market-data provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Provider returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Network timeout
    #[error("Request timeout")]
    Timeout,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Local request budget exhausted; no network I/O was attempted
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Payload is missing a field the formatter cannot do without
    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generic error with context
    #[error("Market data error: {0}")]
    Other(String),
}

impl MarketDataError {
    /// True for the local rate-limit rejection, so callers can show a
    /// "slow down" message instead of retrying.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MarketDataError::RateLimitExceeded)
    }

    /// True for 4xx responses from the provider.
    pub fn is_client_error(&self) -> bool {
        match self {
            MarketDataError::ApiError { status, .. } => (400..500).contains(status),
            MarketDataError::NotFound(_) => true,
            _ => false,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Other(String),
}

/// Third-party packages the embedded swap widget is known to clash with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictingDependency {
    /// Two incompatible ethers/provider major versions in the bundle
    EthersProvider,
    /// Duplicate or mismatched UI runtime
    UiRuntime,
    /// Wallet connector version mismatch
    WalletConnector,
    /// Node built-ins (buffer, process) missing from the browser build
    NodePolyfills,
}

impl ConflictingDependency {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EthersProvider => "ethers provider",
            Self::UiRuntime => "UI runtime",
            Self::WalletConnector => "wallet connector",
            Self::NodePolyfills => "node polyfills",
        }
    }
}

/// Structured failure reported by the widget load boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetLoadError {
    /// The load did not finish within the allotted time
    #[error("Widget load timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// A known dependency conflict prevented the module from initialising
    #[error("Widget dependency conflict: {}", .0.name())]
    DependencyConflict(ConflictingDependency),

    /// The module could not be fetched at all
    #[error("Widget module unavailable: {0}")]
    ModuleUnavailable(String),

    /// Anything else
    #[error("Widget failed to load: {0}")]
    Other(String),
}

impl WidgetLoadError {
    /// Message shown to the user next to the "Use External Now" action.
    pub fn user_message(&self) -> String {
        match self {
            WidgetLoadError::Timeout(_) => {
                "The trading widget is taking too long to load. Switching to the external exchange.".to_string()
            }
            WidgetLoadError::DependencyConflict(dep) => match dep {
                ConflictingDependency::EthersProvider => {
                    "The trading widget needs a different wallet provider version. Please trade on the external exchange.".to_string()
                }
                ConflictingDependency::UiRuntime => {
                    "The trading widget is incompatible with this page. Please trade on the external exchange.".to_string()
                }
                ConflictingDependency::WalletConnector => {
                    "Your wallet connection is not supported by the embedded widget. Please trade on the external exchange.".to_string()
                }
                ConflictingDependency::NodePolyfills => {
                    "The trading widget is missing browser support libraries. Please trade on the external exchange.".to_string()
                }
            },
            WidgetLoadError::ModuleUnavailable(_) | WidgetLoadError::Other(_) => {
                "The trading widget could not be loaded. You can still trade on the external exchange.".to_string()
            }
        }
    }
}

/// Convenience type alias for Results with MarketDataError
pub type MarketDataResult<T> = Result<T, MarketDataError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
