use crate::sync::UnsafeCell;
use derive_more::{Deref, DerefMut, Display};
use std::borrow::Cow;

/// A minimal `UnsafeCell` wrapper that is `Sync` when `T: Send`.
///
/// Used for one-shot result slots: exactly one worker writes the value, and
/// exactly one consumer moves it out after observing completion. No `&T` is
/// ever shared between threads, so `T: Send` is enough.
#[derive(Debug, Deref, DerefMut)]
#[repr(transparent)]
pub(crate) struct SyncUnsafeCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for SyncUnsafeCell<T> {}

impl<T> SyncUnsafeCell<T> {
    pub(crate) fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }
}

/// Human-readable task name, used in logs and failure reports.
pub type TaskName = Cow<'static, str>;

/// Identity of the thread running a piece of work.
///
/// Pool workers are reported by their zero-based index in the pool; any other
/// thread is reported as `main`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum WorkerId {
    /// A worker thread of the executor's pool.
    #[display("{_0}")]
    Pool(usize),
    /// A thread outside of any worker pool.
    #[display("main")]
    External,
}

impl WorkerId {
    /// Identify the calling thread.
    #[must_use]
    pub fn current() -> Self {
        rayon::current_thread_index().map_or(Self::External, Self::Pool)
    }
}
