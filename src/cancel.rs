use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheap, cloneable handle the caller can trip from another thread to
/// abort an in-progress `compare()` call.
///
/// The Comparator polls this at the cadence documented in the crate's
/// concurrency notes (every 100 processed keys, same as progress reporting).
/// Tripping it is not sticky across calls: a fresh token (or a fresh clone
/// of an untripped token) starts every comparison clean.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod cancel_tests;
