mod group;
mod wait;

pub(crate) use crate::executor::group::GroupState;
pub use crate::executor::group::TaskGroup;
pub(crate) use crate::executor::wait::wait_until;
use crate::{config::ExecutorConfig, task::TaskError};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Error returned by `Executor::new` when the worker pool cannot be created.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// The operating system refused to start the worker threads.
    #[error("failed to build worker pool")]
    PoolBuild(#[from] ThreadPoolBuildError),
}

/// Error returned by `Executor::region` when a task of the region failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegionError {
    /// The region body returned a task failure, typically propagated from a
    /// barrier or a handle.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// A task failed and neither a barrier nor `join` on its handle reported
    /// it before the region ended.
    #[error("unobserved failure at region exit: {0}")]
    Unobserved(TaskError),
}

/// Fork-join executor over a fixed pool of worker threads.
///
/// Work is submitted inside a parallel region (`region`). The region body runs
/// on one pool worker and may:
/// - spawn tasks, which idle workers pick up in no particular order,
/// - issue barriers, which wait for every task spawned so far,
/// - join individual task handles.
///
/// Leaving the region waits for every task it spawned, so no task outlives
/// the data it borrows.
#[must_use]
#[derive(Debug)]
pub struct Executor {
    pool: ThreadPool,
    num_threads: usize,
}

impl Executor {
    /// Start the worker pool described by `config`.
    ///
    /// # Errors
    /// If the worker threads cannot be spawned.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ExecutorError> {
        let num_threads = config.resolved_num_threads();
        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()?;
        debug!(num_threads, "worker pool started");
        Ok(Self { pool, num_threads })
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Run `body` as a parallel region on the pool.
    ///
    /// Returns once `body` has returned and every task it spawned has
    /// terminated.
    ///
    /// # Errors
    /// - `RegionError::Task` if `body` returned a task failure.
    /// - `RegionError::Unobserved` if a task failed and neither a barrier nor
    ///   `join` on its handle reported it.
    pub fn region<'scope, R, F>(&self, body: F) -> Result<R, RegionError>
    where
        F: FnOnce(&TaskGroup<'_, 'scope>) -> Result<R, TaskError> + Send,
        R: Send,
    {
        let state = Arc::new(GroupState::new());
        debug!("entering parallel region");
        let outcome = self.pool.scope(|scope| {
            let group = TaskGroup {
                scope,
                state: Arc::clone(&state),
            };
            body(&group)
        });
        // Every spawned task has terminated here: the pool scope joins them.
        debug!("left parallel region");
        let value = outcome?;
        if let Some(error) = state.take_failure() {
            warn!(%error, "task failure left unobserved by the region");
            return Err(RegionError::Unobserved(error));
        }
        Ok(value)
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::{task::TaskHandle, types::WorkerId};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    fn executor(num_threads: usize) -> Executor {
        Executor::new(&ExecutorConfig::default().with_num_threads(num_threads)).unwrap()
    }

    #[test]
    fn pool_size_is_honoured() {
        assert_eq!(executor(3).num_threads(), 3);
    }

    #[test]
    fn barrier_without_tasks_returns() {
        let value = executor(1)
            .region(|group| {
                group.barrier()?;
                group.barrier()?;
                Ok(group.spawned())
            })
            .unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn empty_region_returns_body_value() {
        assert_eq!(executor(2).region(|_| Ok("idle")).unwrap(), "idle");
    }

    #[test]
    fn region_body_runs_on_a_worker() {
        let worker = executor(2).region(|_| Ok(WorkerId::current())).unwrap();
        assert!(matches!(worker, WorkerId::Pool(idx) if idx < 2));
    }

    #[test]
    fn barrier_waits_for_every_task() {
        let finished = AtomicUsize::new(0);
        let seen = executor(4)
            .region(|group| {
                for delay in [30, 10, 20] {
                    let finished = &finished;
                    let _ = group.spawn(move || {
                        thread::sleep(Duration::from_millis(delay));
                        finished.fetch_add(1, Ordering::Relaxed);
                    });
                }
                group.barrier()?;
                assert_eq!(group.outstanding(), 0);
                Ok(finished.load(Ordering::Relaxed))
            })
            .unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn single_worker_barrier_does_not_deadlock() {
        let sum = executor(1)
            .region(|group| {
                let handles: Vec<_> = (1..=4).map(|n| group.spawn(move || n * n)).collect();
                group.barrier()?;
                handles.into_iter().map(TaskHandle::join).sum::<Result<i32, _>>()
            })
            .unwrap();
        assert_eq!(sum, 1 + 4 + 9 + 16);
    }

    #[test]
    fn join_without_barrier_waits_for_task() {
        let value = executor(2)
            .region(|group| {
                let handle = group.spawn_named("slow", || {
                    thread::sleep(Duration::from_millis(20));
                    5_u8
                });
                assert_eq!(handle.name(), "slow");
                handle.join()
            })
            .unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn region_exit_joins_outstanding_tasks() {
        let finished = AtomicUsize::new(0);
        executor(2)
            .region(|group| {
                let finished = &finished;
                let _ = group.spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    finished.fetch_add(1, Ordering::Relaxed);
                });
                Ok(())
            })
            .unwrap();
        assert_eq!(finished.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn every_task_runs_exactly_once() {
        let counts: Vec<_> = (0..64).map(|_| AtomicUsize::new(0)).collect();
        executor(4)
            .region(|group| {
                for count in &counts {
                    let _ = group.spawn(move || count.fetch_add(1, Ordering::Relaxed));
                }
                group.barrier()
            })
            .unwrap();
        assert!(counts.iter().all(|count| count.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn generated_names_are_sequential() {
        let names = executor(1)
            .region(|group| {
                let first = group.spawn(|| ());
                let second = group.spawn(|| ());
                Ok((first.name().to_owned(), second.name().to_owned()))
            })
            .unwrap();
        assert_eq!(names, ("task-0".to_owned(), "task-1".to_owned()));
    }
}
