//! Per-connection token bucket
//!
//! Tokens are bytes. A consumer that overdraws the bucket is told how long to
//! wait, and the deficit is carried forward as negative tokens.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    rate_per_second: f64,
    last_refill: Instant,
}

/// Rate limiter producing pacing delays. A rate of `0` means unlimited.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket refilling at `rate_per_second` bytes per second
    pub fn new(rate_per_second: f64) -> Self {
        let rate = rate_per_second.max(0.0);
        Self {
            state: Mutex::new(BucketState {
                tokens: rate,
                rate_per_second: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0.0)
    }

    /// Reset the rate and refill the bucket completely
    pub fn set_rate(&self, rate_per_second: f64) {
        let rate = rate_per_second.max(0.0);
        let mut state = self.lock();
        state.rate_per_second = rate;
        state.tokens = rate;
        state.last_refill = Instant::now();
    }

    pub fn is_limited(&self) -> bool {
        self.lock().rate_per_second > 0.0
    }

    /// Currently available tokens; negative while in debt
    pub fn tokens(&self) -> f64 {
        self.lock().tokens
    }

    /// Charge `amount` bytes and return how long the caller must wait
    /// before reading them.
    pub fn consume(&self, amount: f64) -> Duration {
        let delay = self.consume_at(amount, Instant::now());
        Duration::from_secs_f64(delay)
    }

    /// Refill for the time elapsed up to `now`, charge `amount`, and return
    /// the delay in seconds.
    fn consume_at(&self, amount: f64, now: Instant) -> f64 {
        let mut state = self.lock();
        if state.rate_per_second <= 0.0 {
            return 0.0;
        }

        let elapsed = now.saturating_duration_since(state.last_refill);
        state.last_refill = now;
        state.tokens = state
            .rate_per_second
            .min(elapsed.as_secs_f64().mul_add(state.rate_per_second, state.tokens));

        state.tokens -= amount;
        if state.tokens >= 0.0 {
            0.0
        } else {
            -state.tokens / state.rate_per_second
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
