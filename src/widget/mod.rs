//! Embedded swap widget loading with an always-available external fallback.

mod loader;
mod state;

pub use loader::{external_trade_url, UnavailableWidgetLoader, WidgetLoader};
pub use state::{SwapWidgetModule, WidgetConfig, WidgetLoadState, WidgetModuleLoader};
