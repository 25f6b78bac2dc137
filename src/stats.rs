// ============================================================================
// stats.rs - Real-time Statistics Tracking
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe statistics tracker
pub struct Statistics {
    generated: AtomicU64,
    balance_hits: AtomicU64,
    start_time: AtomicU64, // Unix timestamp in seconds (thread-safe)
}

impl Statistics {
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Self {
            generated: AtomicU64::new(0),
            balance_hits: AtomicU64::new(0),
            start_time: AtomicU64::new(now),
        }
    }

    pub fn increment_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_balance_hits(&self) {
        self.balance_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn balance_hits(&self) -> u64 {
        self.balance_hits.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> f64 {
        let start = self.start_time.load(Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        now.saturating_sub(start) as f64
    }

    pub fn rate(&self) -> f64 {
        let generated = self.generated() as f64;
        let elapsed = self.elapsed();
        if elapsed > 0.0 {
            generated / elapsed
        } else {
            0.0
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}
