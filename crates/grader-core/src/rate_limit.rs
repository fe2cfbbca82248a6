//! Fixed-window request limiter for AI scoring.
//!
//! Keyed by candidate so one session cannot exhaust the scorer quota for
//! everyone else. The limiter is an ordinary value handed to the engine;
//! tests build their own and nothing is shared between them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Counts requests per key in fixed windows.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` now. Returns `false` when over the limit.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Record a request for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.lock_windows();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            tracing::debug!(key, limit = self.max_requests, "rate limit reached");
            return false;
        }
        entry.count += 1;
        true
    }

    /// Drop windows that have expired.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    /// Drop windows expired at `now`. Returns how many keys are still tracked.
    pub fn prune_at(&self, now: Instant) -> usize {
        let mut windows = self.lock_windows();
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        windows.len()
    }

    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("alice", now));
        assert!(limiter.check_at("alice", now));
        assert!(!limiter.check_at("alice", now));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("alice", now));
        assert!(!limiter.check_at("alice", now));
        assert!(limiter.check_at("bob", now));
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100));
        let start = Instant::now();
        assert!(limiter.check_at("alice", start));
        assert!(!limiter.check_at("alice", start + Duration::from_millis(50)));
        assert!(limiter.check_at("alice", start + Duration::from_millis(100)));
    }

    #[test]
    fn prune_drops_expired_windows_only() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.check_at("alice", start));
        assert!(limiter.check_at("bob", start + Duration::from_secs(8)));

        assert_eq!(limiter.prune_at(start + Duration::from_secs(5)), 2);
        assert_eq!(limiter.prune_at(start + Duration::from_secs(12)), 1);

        // bob's window survived, so bob is still over the limit
        assert!(!limiter.check_at("bob", start + Duration::from_secs(12)));
        assert!(limiter.check_at("alice", start + Duration::from_secs(12)));
    }
}
