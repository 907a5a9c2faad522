//! Sliding-window rate limiting keyed by client address.
//!
//! State lives only in process memory; a restart resets all counters. Per-key
//! timestamp vectors are pruned on every check, but distinct keys are never
//! evicted (known limitation, the set of client addresses grows unbounded).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
pub const RATE_LIMIT_MAX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: usize,
}

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max: usize,
    // Whole-map lock: the read-modify-write of a key's window must be atomic
    // so two concurrent requests cannot both be admitted at the boundary.
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_limits(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX)
    }
}

impl RateLimiter {
    pub fn with_limits(window: Duration, max: usize) -> Self {
        Self {
            window,
            max,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let requests = windows.entry(key.to_string()).or_default();

        requests.retain(|seen| now.duration_since(*seen) < self.window);

        if requests.len() >= self.max {
            return RateDecision {
                allowed: false,
                remaining: 0,
            };
        }

        requests.push(now);
        RateDecision {
            allowed: true,
            remaining: self.max - requests.len(),
        }
    }
}
