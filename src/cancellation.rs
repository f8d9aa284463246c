use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::atomic::AtomicCell;

/// Decides which of two candidates a [`CancellationToken`] keeps.
pub trait Better<T>: Send + Sync {
    /// Whether `candidate` is strictly better than `current`.
    fn is_better(&self, candidate: &T, current: &T) -> bool;
}

/// Smaller wins: leftmost-match searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Less;

/// Larger wins: rightmost-match searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greater;

impl<T> Better<T> for Less where T: PartialOrd {
    fn is_better(&self, candidate: &T, current: &T) -> bool {
        candidate < current
    }
}

impl<T> Better<T> for Greater where T: PartialOrd {
    fn is_better(&self, candidate: &T, current: &T) -> bool {
        candidate > current
    }
}

struct Shared<T, C> {
    best: AtomicCell<T>,
    compare: C,
    cancelled: AtomicBool,
}

/// Lock-free early-exit signal shared by all chunks of one algorithm call.
///
/// Clones are handles to the same state. Chunks report candidates with
/// [`cancel`](CancellationToken::cancel); the token keeps the best one under
/// `C`, so [`get_result`](CancellationToken::get_result) does not depend on the
/// order in which chunks finished.
pub struct CancellationToken<T, C = Less> {
    shared: Arc<Shared<T, C>>,
}

impl<T, C> Clone for CancellationToken<T, C> {
    fn clone(&self) -> Self {
        CancellationToken { shared: self.shared.clone() }
    }
}

impl<T> CancellationToken<T, Less> where T: Copy + Eq + PartialOrd {
    /// Smaller-is-better token starting at `sentinel`, which must be worse than
    /// any real candidate.
    pub fn new(sentinel: T) -> CancellationToken<T, Less> {
        CancellationToken::with_compare(sentinel, Less)
    }
}

impl CancellationToken<(), Less> {
    /// A token that carries no candidate, only the cancelled flag.
    pub fn flag() -> CancellationToken<(), Less> {
        CancellationToken::new(())
    }
}

impl<T, C> CancellationToken<T, C> where T: Copy + Eq, C: Better<T> {
    pub fn with_compare(sentinel: T, compare: C) -> CancellationToken<T, C> {
        CancellationToken {
            shared: Arc::new(Shared {
                best: AtomicCell::new(sentinel),
                compare,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Offers `candidate` and tells every chunk to stop starting new work.
    ///
    /// `best` only ever moves to a strictly better value; a lost race re-reads
    /// the winner and compares again.
    pub fn cancel(&self, candidate: T) {
        let shared = &*self.shared;
        let mut current = shared.best.load();
        while shared.compare.is_better(&candidate, &current) {
            match shared.best.compare_exchange(current, candidate) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        shared.cancelled.store(true, Ordering::Release);
    }

    pub fn was_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Relaxed)
    }

    /// Whether some chunk already holds a candidate at least as good as
    /// `candidate`, making work at that position pointless.
    pub fn was_cancelled_at(&self, candidate: &T) -> bool {
        self.was_cancelled() && !self.shared.compare.is_better(candidate, &self.shared.best.load())
    }

    /// The best candidate so far, or the sentinel if nothing was offered.
    pub fn get_result(&self) -> T {
        self.shared.best.load()
    }
}

impl<T, C> fmt::Debug for CancellationToken<T, C> where T: Copy + fmt::Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("best", &self.shared.best.load())
            .field("cancelled", &self.shared.cancelled.load(Ordering::Relaxed))
            .finish()
    }
}
