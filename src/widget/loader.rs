//! Embedded-widget load attempts with timeout and automatic fallback.

use crate::error::WidgetLoadError;
use crate::widget::{SwapWidgetModule, WidgetConfig, WidgetLoadState, WidgetModuleLoader};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Control {
    /// Bumped whenever an attempt is started or cancelled; a task only
    /// applies transitions while its generation is current.
    generation: u64,
    wallet_connected: bool,
    /// The user (or the automatic fallback) chose the external exchange
    superseded: bool,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    loader: Arc<dyn WidgetModuleLoader>,
    config: WidgetConfig,
    state: watch::Sender<WidgetLoadState>,
    control: Mutex<Control>,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: WidgetLoadState) {
        tracing::info!(state = next.as_str(), "Widget state changed");
        self.state.send_replace(next);
    }

    /// Cancel whatever attempt is pending so its timers can no longer fire.
    fn cancel_attempt(&self, control: &mut Control) {
        control.generation += 1;
        if let Some(task) = control.task.take() {
            task.abort();
        }
    }

    fn enter_fallback(&self, control: &mut Control) {
        self.cancel_attempt(control);
        control.superseded = true;
        self.set_state(WidgetLoadState::FallbackActive);
    }

    fn start_attempt(self: &Arc<Self>, control: &mut Control) {
        self.cancel_attempt(control);
        self.set_state(WidgetLoadState::Loading);

        let generation = control.generation;
        let loader = self.loader.clone();
        let config = self.config.clone();
        let inner = Arc::downgrade(self);
        control.task = Some(tokio::spawn(run_attempt(
            inner, loader, config, generation,
        )));
    }

    /// Apply `next` if `generation` is still current and the state matches
    /// `expected`. Returns whether the transition happened.
    fn transition(
        &self,
        generation: u64,
        expected: fn(&WidgetLoadState) -> bool,
        next: WidgetLoadState,
    ) -> bool {
        let mut control = self.control();
        if control.generation != generation || !expected(&*self.state.borrow()) {
            return false;
        }
        if matches!(next, WidgetLoadState::FallbackActive) {
            control.superseded = true;
            control.task = None;
        }
        self.set_state(next);
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let control = self.control.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = control.task.take() {
            task.abort();
        }
    }
}

async fn run_attempt(
    inner: Weak<Inner>,
    loader: Arc<dyn WidgetModuleLoader>,
    config: WidgetConfig,
    generation: u64,
) {
    let outcome = match tokio::time::timeout(config.load_timeout, loader.load()).await {
        Ok(result) => result,
        Err(_) => Err(WidgetLoadError::Timeout(config.load_timeout)),
    };

    {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        match outcome {
            Ok(module) => {
                tracing::info!(module = %module.name, version = %module.version, "Swap widget loaded");
                inner.transition(
                    generation,
                    WidgetLoadState::is_loading,
                    WidgetLoadState::Ready(Arc::new(module)),
                );
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Swap widget failed to load");
                if !inner.transition(
                    generation,
                    WidgetLoadState::is_loading,
                    WidgetLoadState::Failed(e),
                ) {
                    return;
                }
            }
        }
    }

    tokio::time::sleep(config.fallback_delay).await;

    if let Some(inner) = inner.upgrade() {
        inner.transition(
            generation,
            WidgetLoadState::is_failed,
            WidgetLoadState::FallbackActive,
        );
    }
}

/// State machine behind the token page's trading panel.
///
/// Loads the embedded swap widget once a wallet is connected, gives up after
/// `load_timeout`, and switches to the external exchange `fallback_delay`
/// after a failure. Every pending timer belongs to one attempt; starting,
/// abandoning or disconnecting cancels it, so a stale attempt can never touch
/// a newer one. Dropping the loader cancels everything.
///
/// Methods that start an attempt spawn onto the current Tokio runtime.
pub struct WidgetLoader {
    inner: Arc<Inner>,
}

impl WidgetLoader {
    pub fn new(loader: Arc<dyn WidgetModuleLoader>, config: WidgetConfig) -> Self {
        let (state, _) = watch::channel(WidgetLoadState::NotStarted);
        Self {
            inner: Arc::new(Inner {
                loader,
                config,
                state,
                control: Mutex::new(Control {
                    generation: 0,
                    wallet_connected: false,
                    superseded: false,
                    task: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> WidgetLoadState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetLoadState> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    pub fn is_wallet_connected(&self) -> bool {
        self.inner.control().wallet_connected
    }

    /// The wallet became connected.
    ///
    /// Starts a load unless one is already under way or has settled. If the
    /// external exchange was chosen earlier in the session, goes straight
    /// back to it.
    pub fn wallet_connected(&self) {
        let mut control = self.inner.control();
        control.wallet_connected = true;
        if *self.inner.state.borrow() != WidgetLoadState::NotStarted {
            return;
        }
        if control.superseded {
            self.inner.enter_fallback(&mut control);
        } else {
            self.inner.start_attempt(&mut control);
        }
    }

    /// The wallet disconnected: cancel everything and reset.
    pub fn wallet_disconnected(&self) {
        let mut control = self.inner.control();
        control.wallet_connected = false;
        self.inner.cancel_attempt(&mut control);
        self.inner.set_state(WidgetLoadState::NotStarted);
    }

    /// "Use External Now": skip the wait while loading or after a failure.
    ///
    /// Returns false when the current state offers no such action.
    pub fn use_external_now(&self) -> bool {
        let mut control = self.inner.control();
        let state = self.inner.state.borrow().clone();
        match state {
            WidgetLoadState::Loading | WidgetLoadState::Failed(_) => {
                self.inner.enter_fallback(&mut control);
                true
            }
            _ => false,
        }
    }

    /// "Try Embedded": start a fresh attempt from `Ready` or `FallbackActive`.
    ///
    /// Requires a connected wallet. Returns false when nothing was started.
    pub fn try_embedded(&self) -> bool {
        let mut control = self.inner.control();
        if !control.wallet_connected {
            return false;
        }
        let state = self.inner.state.borrow().clone();
        match state {
            WidgetLoadState::Ready(_) | WidgetLoadState::FallbackActive => {
                control.superseded = false;
                self.inner.start_attempt(&mut control);
                true
            }
            _ => false,
        }
    }

    /// Link to trade `token_address` on the external exchange. Always available.
    pub fn external_trade_url(&self, token_address: &str) -> String {
        external_trade_url(&self.inner.config.external_swap_url, token_address)
    }
}

pub fn external_trade_url(base_url: &str, token_address: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}outputCurrency={}",
        base_url.trim_end_matches('/'),
        separator,
        urlencoding::encode(token_address)
    )
}

/// Loader for builds that ship without the embedded widget.
pub struct UnavailableWidgetLoader;

#[async_trait::async_trait]
impl WidgetModuleLoader for UnavailableWidgetLoader {
    async fn load(&self) -> Result<SwapWidgetModule, WidgetLoadError> {
        Err(WidgetLoadError::ModuleUnavailable(
            "embedded swap widget is not bundled".to_string(),
        ))
    }
}
