//! In-flight prefetch tracking.
//!
//! Deduplicates concurrent prefetch triggers for the same key: exactly one
//! caller owns the prefetch until it releases, and release is guaranteed
//! by the owning task regardless of outcome. A leaked key would block
//! prefetches for that content forever.

use dashmap::DashSet;

/// Concurrency-safe set of keys currently undergoing prefetch.
pub struct InFlightSet {
    keys: DashSet<String>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self {
            keys: DashSet::new(),
        }
    }

    /// Claim the prefetch for `key`. Returns true if this caller now owns
    /// it, false if a prefetch for the key is already in progress.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    /// Release the prefetch for `key`. Idempotent; releasing an absent key
    /// is a no-op.
    pub fn release(&self, key: &str) {
        self.keys.remove(key);
    }

    /// Number of prefetches currently in flight.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for InFlightSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let set = InFlightSet::new();

        assert!(set.try_acquire("posts/a"));
        assert!(!set.try_acquire("posts/a"));
        assert_eq!(set.len(), 1);

        set.release("posts/a");
        assert!(set.try_acquire("posts/a"));
    }

    #[test]
    fn keys_are_independent() {
        let set = InFlightSet::new();

        assert!(set.try_acquire("posts/a"));
        assert!(set.try_acquire("posts/b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let set = InFlightSet::new();

        set.release("never-acquired");
        assert!(set.try_acquire("posts/a"));
        set.release("posts/a");
        set.release("posts/a");
        assert!(set.is_empty());
    }

    #[test]
    fn concurrent_acquire_admits_exactly_one_winner() {
        let set = Arc::new(InFlightSet::new());
        let wins = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                let wins = wins.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if set.try_acquire("hot-post") {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("acquire thread should not panic");
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(set.len(), 1);
    }
}
