use crate::{
    executor::wait::wait_until,
    latch::CountLatch,
    task::{TaskError, TaskHandle, TaskSlot},
    types::TaskName,
};
use derive_more::Debug;
use rayon::Scope;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::{debug, trace, warn};

/// Bookkeeping shared by a group, the tasks it spawned and their handles.
#[derive(Debug)]
pub(crate) struct GroupState {
    latch: CountLatch,
    /// Failures nobody has reported yet, keyed by spawn sequence number, in
    /// the order the tasks failed.
    failures: Mutex<Vec<(usize, TaskError)>>,
    spawned: AtomicUsize,
}

impl GroupState {
    pub(crate) fn new() -> Self {
        Self {
            latch: CountLatch::new(),
            failures: Mutex::new(Vec::new()),
            spawned: AtomicUsize::new(0),
        }
    }

    pub(crate) fn latch(&self) -> &CountLatch {
        &self.latch
    }

    fn record_failure(&self, seq: usize, error: TaskError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((seq, error));
    }

    /// Drop the failure of task `seq`: its handle has returned it to the caller.
    pub(crate) fn forget_failure(&self, seq: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(failed, _)| *failed != seq);
    }

    /// Drain the failure list, returning the first recorded entry. The others
    /// are discarded.
    pub(super) fn take_failure(&self) -> Option<TaskError> {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        let mut drained = std::mem::take(&mut *failures).into_iter();
        let first = drained.next().map(|(_, error)| error);
        for (_, error) in drained {
            debug!(%error, "further task failure discarded");
        }
        first
    }
}

/// Handle to the parallel region currently executing.
///
/// Valid only inside `Executor::region`. Every task spawned through it is
/// joined before the region returns, whether or not a barrier was issued.
#[derive(Debug)]
pub struct TaskGroup<'r, 'scope> {
    #[debug(skip)]
    pub(super) scope: &'r Scope<'scope>,
    pub(super) state: Arc<GroupState>,
}

impl<'scope> TaskGroup<'_, 'scope> {
    /// Submit `work` for execution on the pool and return immediately.
    ///
    /// The task gets a generated name; see `spawn_named`.
    pub fn spawn<T, W>(&self, work: W) -> TaskHandle<T>
    where
        T: Send + 'scope,
        W: FnOnce() -> T + Send + 'scope,
    {
        let seq = self.state.spawned.load(Ordering::Relaxed);
        self.spawn_named(format!("task-{seq}"), work)
    }

    /// Submit `work` under `name` for execution on the pool and return
    /// immediately.
    ///
    /// A panic inside `work` terminates only this task. It is reported once:
    /// by `join` on the handle, otherwise by the next `barrier`, otherwise on
    /// region exit.
    pub fn spawn_named<T, W>(&self, name: impl Into<TaskName>, work: W) -> TaskHandle<T>
    where
        T: Send + 'scope,
        W: FnOnce() -> T + Send + 'scope,
    {
        let name = name.into();
        let slot = Arc::new(TaskSlot::new());
        self.state.latch.increment();
        let seq = self.state.spawned.fetch_add(1, Ordering::Relaxed);
        debug!(task = %name, "task spawned");

        let state = Arc::clone(&self.state);
        let task_slot = Arc::clone(&slot);
        let task_name = name.clone();
        self.scope.spawn(move |_| {
            trace!(task = %task_name, "task started");
            let outcome = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(|payload| TaskError::from_panic(task_name.clone(), &*payload));
            if let Err(error) = &outcome {
                warn!(%error, "task failed");
                state.record_failure(seq, error.clone());
            }
            // SAFETY: This job runs exactly once and is the slot's only writer.
            unsafe { task_slot.publish(outcome) };
            state.latch.complete();
            trace!(task = %task_name, "task finished");
        });

        TaskHandle::new(name, seq, slot, Arc::clone(&self.state))
    }

    /// Wait until every task spawned in this region so far has terminated.
    ///
    /// Returns immediately when nothing is outstanding. On a pool worker the
    /// caller executes pending tasks while waiting.
    ///
    /// # Errors
    /// The first task failure recorded since the previous barrier, unless its
    /// handle already returned it. The barrier still waits for all tasks
    /// before reporting it. Further failures from the same interval are
    /// discarded; only the warnings logged when they happened remain.
    pub fn barrier(&self) -> Result<(), TaskError> {
        let latch = &self.state.latch;
        debug!(outstanding = latch.pending(), "barrier entered");
        wait_until(latch, || latch.probe());
        debug!("barrier released");
        self.state.take_failure().map_or(Ok(()), Err)
    }

    /// Number of tasks spawned but not yet terminated. Racy by nature.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state.latch.pending()
    }

    /// Number of tasks spawned in this region so far.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.state.spawned.load(Ordering::Relaxed)
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    fn panicked(task: &'static str) -> TaskError {
        TaskError::Panicked {
            task: task.into(),
            message: "boom".to_owned(),
        }
    }

    #[test]
    fn forgotten_failure_is_not_taken() {
        let state = GroupState::new();
        state.record_failure(0, panicked("a"));
        state.record_failure(1, panicked("b"));
        state.forget_failure(0);
        assert_eq!(state.take_failure(), Some(panicked("b")));
        assert_eq!(state.take_failure(), None);
    }

    #[test]
    fn take_failure_returns_the_oldest_and_drains() {
        let state = GroupState::new();
        state.record_failure(3, panicked("late"));
        state.record_failure(1, panicked("second"));
        assert_eq!(state.take_failure(), Some(panicked("late")));
        assert_eq!(state.take_failure(), None);
    }
}
