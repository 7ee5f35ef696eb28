use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::Quota;

/// Last quota state reported by the upstream
#[derive(Debug, Clone, Copy)]
struct RateLimiterState {
    remaining: u32,
    total: u32,
    reset_at: Option<Instant>,
}

/// Reactive gate in front of the shared upstream quota.
///
/// The limiter never counts requests itself: the only source of truth is the
/// quota metadata of the latest response passed to [`RateLimiter::update`],
/// since other clients (or retries we never see) consume the same quota.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    /// Creates a limiter that assumes a full quota of `total` until told otherwise
    pub fn new(total: u32) -> Self {
        Self {
            state: Mutex::new(RateLimiterState {
                remaining: total,
                total,
                reset_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RateLimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspends the caller until the quota window resets when at most one
    /// request is left; returns immediately otherwise
    pub async fn limit(&self) {
        let wait = self.pending_wait();
        if wait.is_zero() {
            return;
        }

        log::warn!(
            "Upstream quota exhausted, waiting {:.1}s for reset",
            wait.as_secs_f64()
        );
        tokio::time::sleep(wait).await;
    }

    /// How long [`RateLimiter::limit`] would currently suspend
    pub fn pending_wait(&self) -> Duration {
        let state = self.lock();
        if state.remaining > 1 {
            return Duration::ZERO;
        }
        state
            .reset_at
            .map(|reset_at| reset_at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Overwrites the state with the upstream's latest accounting
    pub fn update(&self, quota: &Quota) {
        let mut state = self.lock();
        state.remaining = quota.remaining;
        state.total = quota.total;
        state.reset_at = Some(Instant::now() + Duration::from_secs(quota.reset_secs));
    }

    /// Requests left in the current window; a window that has already reset
    /// is presumed refreshed to the full quota
    pub fn remaining(&self) -> u32 {
        let state = self.lock();
        match state.reset_at {
            Some(reset_at) if reset_at <= Instant::now() => state.total,
            _ => state.remaining,
        }
    }

    pub fn total(&self) -> u32 {
        self.lock().total
    }
}
