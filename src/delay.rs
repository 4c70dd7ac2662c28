//! Adaptive prefetch delay controller.
//!
//! The delay before an access-triggered prefetch scales with how expensive
//! prefetches currently are: each completed prefetch feeds its wall time
//! back, the target is one tenth of that cost, and an exponential moving
//! average (alpha = 0.3) smooths single slow outliers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::WarmingConfig;

const EMA_ALPHA: f64 = 0.3;
const TARGET_DIVISOR: u64 = 10;

/// Shared delay scalar with EMA feedback, always within `[min, max]`.
pub struct AdaptiveDelay {
    current_ms: AtomicU64,
    min_ms: u64,
    max_ms: u64,
}

impl AdaptiveDelay {
    pub fn new(config: &WarmingConfig) -> Self {
        let min_ms = config.min_delay_ms;
        let max_ms = config.max_delay_ms.max(min_ms);
        Self {
            current_ms: AtomicU64::new(config.prefetch_delay_ms.clamp(min_ms, max_ms)),
            min_ms,
            max_ms,
        }
    }

    /// The delay to apply before the next scheduled prefetch.
    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::SeqCst))
    }

    /// Fold one observed prefetch duration into the delay.
    ///
    /// Updates are serialized through a compare-exchange loop so
    /// concurrent observations never clobber each other.
    pub fn record_observation(&self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis().min(u128::from(u64::MAX)) as u64;
        let target = (elapsed_ms / TARGET_DIVISOR).clamp(self.min_ms, self.max_ms);

        let _ = self
            .current_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                let updated =
                    (EMA_ALPHA * target as f64 + (1.0 - EMA_ALPHA) * current as f64).round() as u64;
                Some(updated.clamp(self.min_ms, self.max_ms))
            });
    }
}
