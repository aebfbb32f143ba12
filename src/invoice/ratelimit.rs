//! Per-user sliding-window limiter for invoice submissions.
//!
//! State is process-local and unpersisted: a restart clears every window,
//! and horizontally scaled deployments each enforce the limit on their own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

const RATE_LIMIT_COUNT: usize = 5;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding window of recent submission timestamps, keyed by owner.
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<Uuid, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Prune timestamps older than the window, then allow iff fewer than
    /// `max_requests` remain. The new timestamp is recorded on allow.
    ///
    /// Prune, count and record happen under a single lock acquisition, so
    /// two concurrent requests from the same owner cannot both slip past
    /// the limit.
    pub fn check_and_record(&self, owner_id: Uuid) -> bool {
        self.check_and_record_at(owner_id, Instant::now())
    }

    pub fn check_and_record_at(&self, owner_id: Uuid, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        let timestamps = windows.entry(owner_id).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_COUNT, RATE_LIMIT_WINDOW)
    }
}
