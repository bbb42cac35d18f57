//! Sliding-window request budget.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window rate limiter.
///
/// Keeps the instants of recent requests; anything older than the window is
/// pruned on every check. The number of retained instants never exceeds
/// `max_requests`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True when another request fits in the current window.
    pub fn can_make_request(&self) -> bool {
        let requests = self.pruned(Instant::now());
        requests.len() < self.max_requests
    }

    /// Record a request made now.
    ///
    /// Refuses to record past the budget so the window invariant holds even if
    /// a caller skipped `can_make_request`.
    pub fn record_request(&self) {
        let now = Instant::now();
        let mut requests = self.pruned(now);
        if requests.len() < self.max_requests {
            requests.push_back(now);
        }
    }

    /// Check and record in one step. Returns false when the budget is spent.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut requests = self.pruned(now);
        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }

    /// Requests still available in the current window.
    pub fn remaining(&self) -> usize {
        let requests = self.pruned(Instant::now());
        self.max_requests.saturating_sub(requests.len())
    }

    /// How long until the oldest retained request leaves the window.
    pub fn time_until_available(&self) -> Duration {
        let now = Instant::now();
        let requests = self.pruned(now);
        if requests.len() < self.max_requests {
            return Duration::ZERO;
        }
        requests
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    fn pruned(&self, now: Instant) -> MutexGuard<'_, VecDeque<Instant>> {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(oldest) = requests.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }
        requests
    }
}
