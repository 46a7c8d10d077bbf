//! Fixed-window rate limiting keyed by client identifier.
//!
//! # Responsibilities
//! - Admit or deny a request for a key within the current window
//! - Bound table growth by evicting entries past their window plus a grace
//!
//! # Design Decisions
//! - Fixed window, not sliding: the full quota resets at window boundaries
//! - The dashmap entry guard holds its shard lock across the whole
//!   read-check-mutate sequence, so per-key updates are serialized and keys
//!   on different shards never contend
//! - Counts saturate at the cap instead of growing unbounded
//! - `max_requests = 0` disables the limiter (fail-open switch)

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::schema::RateLimitConfig;
use crate::lifecycle::ShutdownHandle;

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// In-memory per-key rate limiter with fixed-window counters.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::from_parts(
            config.max_requests,
            Duration::from_secs(config.window_secs),
        )
    }

    fn from_parts(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Returns `true` if the request is admitted for this key.
    ///
    /// The first request per key per window creates a fresh entry; an entry
    /// whose window has passed is replaced, never incremented.
    pub fn admit(&self, key: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= entry.reset_at {
            // Window rolled over: replace, don't increment.
            entry.count = 1;
            entry.reset_at = now + self.window;
            true
        } else if entry.count < self.max_requests {
            entry.count += 1;
            true
        } else {
            false
        }
    }

    /// Drop entries whose window expired more than one grace window ago.
    ///
    /// `retain` takes each shard lock in turn, so it never removes an entry
    /// while an in-flight `admit` holds it.
    pub fn sweep(&self) {
        let now = Instant::now();
        let grace = self.window;
        self.entries.retain(|_, entry| now < entry.reset_at + grace);
    }

    /// Number of tracked keys. Exposed for the sweeper's log line.
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

/// Run the eviction sweep on an interval until shutdown.
pub async fn run_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: ShutdownHandle,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let before = limiter.tracked_keys();
                limiter.sweep();
                tracing::debug!(
                    before,
                    after = limiter.tracked_keys(),
                    "rate limit table swept"
                );
            }
            _ = shutdown.wait() => break,
        }
    }
}
