use crate::config::Config;
use crate::error::WidgetLoadError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a loaded embedded swap widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapWidgetModule {
    pub name: String,
    pub version: String,
}

/// Source of the embedded widget module.
///
/// The real implementation is a dynamic import owned by the host; tests
/// substitute loaders that hang, fail or resolve after a delay.
#[async_trait]
pub trait WidgetModuleLoader: Send + Sync {
    async fn load(&self) -> Result<SwapWidgetModule, WidgetLoadError>;
}

/// Where the trading panel currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetLoadState {
    /// No wallet, or nothing attempted yet
    NotStarted,
    Loading,
    Ready(Arc<SwapWidgetModule>),
    /// Load failed; falls back automatically after the fallback delay
    Failed(WidgetLoadError),
    /// Trading happens on the external exchange
    FallbackActive,
}

impl WidgetLoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
            Self::FallbackActive => "fallback_active",
        }
    }

    /// Message to show alongside a failed load.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Failed(e) => Some(e.user_message()),
            _ => None,
        }
    }
}

/// Timings and fallback target for the widget loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub load_timeout: Duration,
    pub fallback_delay: Duration,
    pub external_swap_url: String,
}

impl WidgetConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            load_timeout: config.widget_load_timeout(),
            fallback_delay: config.widget_fallback_delay(),
            external_swap_url: config.external_swap_url.clone(),
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = WidgetConfig::default();
        assert_eq!(config.load_timeout, Duration::from_secs(10));
        assert_eq!(config.fallback_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_failed_state_message() {
        let state = WidgetLoadState::Failed(WidgetLoadError::Timeout(Duration::from_secs(10)));
        assert!(state.is_failed());
        assert_eq!(state.as_str(), "failed");
        assert!(state.user_message().unwrap().contains("too long"));
        assert!(WidgetLoadState::Loading.user_message().is_none());
    }
}
