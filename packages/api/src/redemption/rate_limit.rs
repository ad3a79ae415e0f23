use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use m1ssion_types::Rejection;

/// Fixed-window attempt counter per key. The window starts at the first
/// attempt and the counter expires with it.
///
/// This is throughput control only; it plays no part in claim uniqueness.
pub struct RateLimiter {
    max_attempts: u32,
    counters: moka::sync::Cache<String, Arc<AtomicU32>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        let counters = moka::sync::Cache::builder()
            .max_capacity(100_000)
            .time_to_live(window)
            .build();
        Self {
            max_attempts,
            counters,
        }
    }

    /// Counts an attempt for `key`, refusing it once the window's budget is spent.
    pub fn check(&self, key: &str) -> Result<(), Rejection> {
        let counter = self
            .counters
            .get_with_by_ref(key, || Arc::new(AtomicU32::new(0)));
        let attempts = counter.fetch_add(1, Ordering::Relaxed) + 1;

        if attempts > self.max_attempts {
            tracing::info!(key, attempts, "Rate limit exceeded");
            return Err(Rejection::RateLimited);
        }
        Ok(())
    }
}
