use crate::latch::CountLatch;
use rayon::Yield;
use std::time::Duration;

/// How long an idle waiter sleeps before looking for stealable work again.
const PARK_INTERVAL: Duration = Duration::from_millis(5);

/// Block until `ready` holds.
///
/// On a pool worker the waiter keeps executing pending pool jobs, so a
/// waiting task never starves the tasks it waits for, even on a single-thread
/// pool. When no job is available, or off the pool, it parks on `latch` until
/// the next task completion.
pub(crate) fn wait_until(latch: &CountLatch, ready: impl Fn() -> bool) {
    while !ready() {
        match rayon::yield_now() {
            Some(Yield::Executed) => {}
            _ => latch.park_unless(&ready, PARK_INTERVAL),
        }
    }
}
