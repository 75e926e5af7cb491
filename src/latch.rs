use crate::sync::{AtomicUsize, Ordering, fence};
use std::{
    sync::{Condvar, Mutex, PoisonError},
    time::Duration,
};

/// Counts tasks that have been spawned but have not reached a terminal state.
///
/// Completion is published with a `Release` decrement. An observer that sees
/// the counter at zero issues an `Acquire` fence, so everything written by
/// every completed task happens-before the observer's subsequent reads. The
/// decrements form a release sequence, hence only the last one has to be seen.
///
/// Waiters may park on the latch; every completion wakes them so they can
/// re-check their own condition.
#[derive(Debug)]
pub(crate) struct CountLatch {
    pending: AtomicUsize,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl CountLatch {
    pub(crate) fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            lock: Mutex::new(()),
            wakeup: Condvar::new(),
        }
    }

    /// Register one more outstanding task.
    pub(crate) fn increment(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark one outstanding task as terminated.
    pub(crate) fn complete(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::Release);
        assert_ne!(previous, 0, "CountLatch::complete: underflow");
        // Notifying under the lock pairs with the check-then-wait in `park_unless`.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.wakeup.notify_all();
    }

    /// Whether all registered tasks have terminated.
    ///
    /// Returning `true` establishes happens-before with every completion.
    pub(crate) fn probe(&self) -> bool {
        if self.pending.load(Ordering::Relaxed) == 0 {
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    /// Snapshot of the outstanding count, for diagnostics only.
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Block until some task completes or `timeout` elapses, unless `ready`
    /// already holds.
    pub(crate) fn park_unless(&self, ready: impl Fn() -> bool, timeout: Duration) {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if ready() {
            return;
        }
        let _ = self
            .wakeup
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Instant};

    #[test]
    fn empty_latch_is_settled() {
        let latch = CountLatch::new();
        assert!(latch.probe());
        assert_eq!(latch.pending(), 0);
    }

    #[test]
    fn settles_after_every_completion() {
        let latch = CountLatch::new();
        latch.increment();
        latch.increment();
        assert!(!latch.probe());
        latch.complete();
        assert!(!latch.probe());
        assert_eq!(latch.pending(), 1);
        latch.complete();
        assert!(latch.probe());
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn completing_without_registration_panics() {
        CountLatch::new().complete();
    }

    #[test]
    fn park_returns_immediately_when_ready() {
        let latch = CountLatch::new();
        let started = Instant::now();
        latch.park_unless(|| true, Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn parked_waiter_is_woken_by_completion() {
        let latch = Arc::new(CountLatch::new());
        latch.increment();
        let worker = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                latch.complete();
            })
        };
        let started = Instant::now();
        while !latch.probe() {
            latch.park_unless(|| latch.probe(), Duration::from_secs(10));
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        worker.join().unwrap();
    }
}
