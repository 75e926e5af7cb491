use crate::{
    executor::{GroupState, wait_until},
    sync::*,
    types::{SyncUnsafeCell, TaskName},
};
use core::fmt;
use std::{any::Any, sync::Arc};
use thiserror::Error;

/// Terminal failure of a single task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    /// The task's work function panicked. The panic was caught on the worker;
    /// the task is considered terminated.
    #[error("task `{task}` panicked: {message}")]
    Panicked {
        /// Name the task was spawned with.
        task: TaskName,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl TaskError {
    pub(crate) fn from_panic(task: TaskName, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "<non-string panic payload>".to_owned()
        };
        Self::Panicked { task, message }
    }

    /// Name of the failed task.
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Panicked { task, .. } => task,
        }
    }
}

pub(crate) type TaskOutcome<T> = Result<T, TaskError>;

/// One-shot result slot shared by a task and its handle.
///
/// Written exactly once by the worker that executes the task, then moved out
/// at most once by the handle after `is_finished` returned `true`.
#[derive(Debug)]
pub(crate) struct TaskSlot<T> {
    output: SyncUnsafeCell<Option<TaskOutcome<T>>>,
    finished: AtomicBool,
}

impl<T> TaskSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            output: SyncUnsafeCell::new(None),
            finished: AtomicBool::new(false),
        }
    }

    /// # Safety
    ///
    /// Must be called at most once, and never concurrently with `take`.
    pub(crate) unsafe fn publish(&self, outcome: TaskOutcome<T>) {
        // SAFETY: The only writer; readers wait for `finished` before touching
        // the cell.
        unsafe {
            self.output
                .get_mut()
                .with(|ptr| *ptr.as_mut().expect("TaskSlot::publish") = Some(outcome));
        }
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// # Safety
    ///
    /// `is_finished` must have returned `true` on this thread, and the slot
    /// must not have been taken before.
    pub(crate) unsafe fn take(&self) -> TaskOutcome<T> {
        // SAFETY: The writer has published (Acquire above) and will not touch
        // the cell again; the caller is the single consumer.
        unsafe {
            self.output.get_mut().with(|ptr| {
                ptr.as_mut()
                    .expect("TaskSlot::take: [1]")
                    .take()
                    .expect("TaskSlot::take: [2]")
            })
        }
    }
}

/// Typed, one-shot receiver for the result of a spawned task.
///
/// The value can only be obtained once the task has terminated, either via
/// `join`, which waits for it, or after a barrier of the group that spawned
/// it.
#[must_use = "dropping a task handle discards the task's result"]
pub struct TaskHandle<T> {
    name: TaskName,
    /// Spawn sequence number within the group.
    seq: usize,
    slot: Arc<TaskSlot<T>>,
    group: Arc<GroupState>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(
        name: TaskName,
        seq: usize,
        slot: Arc<TaskSlot<T>>,
        group: Arc<GroupState>,
    ) -> Self {
        Self {
            name,
            seq,
            slot,
            group,
        }
    }

    /// Name the task was spawned with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task has reached a terminal state. Never blocks.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.is_finished()
    }

    /// Wait for the task to terminate and return its result.
    ///
    /// When called on a pool worker, other pending tasks are executed while
    /// waiting.
    ///
    /// # Errors
    /// If the task panicked. The failure then counts as reported: neither a
    /// later barrier nor the region exit reports it again.
    pub fn join(self) -> Result<T, TaskError> {
        let Self {
            name: _,
            seq,
            slot,
            group,
        } = self;
        wait_until(group.latch(), || slot.is_finished());
        // SAFETY: `is_finished` returned `true` on this thread, and the handle is
        // consumed, so the slot is taken exactly once.
        let outcome = unsafe { slot.take() };
        if outcome.is_err() {
            // The worker recorded the failure before publishing the slot.
            group.forget_failure(seq);
        }
        outcome
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip() {
        let slot = TaskSlot::new();
        assert!(!slot.is_finished());
        unsafe { slot.publish(Ok(42_i32)) };
        assert!(slot.is_finished());
        assert_eq!(unsafe { slot.take() }, Ok(42));
    }

    #[test]
    fn handle_of_finished_task_joins_without_pool() {
        let slot = Arc::new(TaskSlot::new());
        unsafe { slot.publish(Ok("done")) };
        let handle = TaskHandle::new("ready".into(), 0, slot, Arc::new(GroupState::new()));
        assert!(handle.is_finished());
        assert_eq!(handle.name(), "ready");
        assert_eq!(handle.join(), Ok("done"));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let opaque: Box<dyn Any + Send> = Box::new(7_u8);

        let err = TaskError::from_panic("a".into(), &*static_str);
        assert_eq!(err.to_string(), "task `a` panicked: boom");
        assert_eq!(err.task(), "a");
        assert_eq!(
            TaskError::from_panic("b".into(), &*owned).to_string(),
            "task `b` panicked: bang"
        );
        assert_eq!(
            TaskError::from_panic("c".into(), &*opaque).to_string(),
            "task `c` panicked: <non-string panic payload>"
        );
    }

    #[test]
    fn handle_debug_shows_state() {
        let handle = TaskHandle::<u8>::new(
            "pending".into(),
            0,
            Arc::new(TaskSlot::new()),
            Arc::new(GroupState::new()),
        );
        let rendered = format!("{handle:?}");
        assert!(rendered.contains("pending"));
        assert!(rendered.contains("finished: false"));
    }
}
