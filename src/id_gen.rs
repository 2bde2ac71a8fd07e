//! Monotonic task id allocation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing ids. Gaps are allowed, reuse is not.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Seed from the highest id already in use.
    pub fn new(max_observed_id: u64) -> Self {
        Self {
            next: AtomicU64::new(max_observed_id.saturating_add(1)),
        }
    }

    /// Return the current value and move past it.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Make sure `candidate` is never handed out.
    ///
    /// Raises the counter to `candidate + 1` when `candidate` is at or above
    /// it; otherwise leaves it alone. The counter never moves backwards.
    pub fn advance(&self, candidate: u64) {
        self.next
            .fetch_max(candidate.saturating_add(1), Ordering::SeqCst);
    }

    /// The id the next call to [`IdGenerator::next`] would return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
