//! Fork-join task graph executor with scoped parallel regions.
//!
//! This crate runs small task dependency graphs on a fixed pool of worker
//! threads. It:
//! - Spawns independent units of work onto the pool; idle workers pick them up
//!   in no particular order.
//! - Provides a barrier that blocks the issuing context until every task
//!   spawned so far has terminated. A waiter that is itself a worker keeps
//!   executing pending tasks, so even a single-thread pool makes progress.
//! - Hands results back through one-shot typed task handles instead of shared
//!   mutable variables. Completion is published with Release/Acquire ordering,
//!   so a value is only ever read after its writer has finished.
//! - Joins every task of a region on region exit (structured concurrency).
//!
//! Key modules:
//! - `config`: pool sizing (`ExecutorConfig`).
//! - `executor`: the worker pool, parallel regions and task groups.
//! - `task`: task handles and task failures.
//! - `graph`: the fixed A/B/C → f1 → f2 graph and its work functions.
//! - `trace`: sinks for the human-readable progress lines.
//!
//! Quick start:
//! ```no_run
//! use taskgraph::{config::ExecutorConfig, executor::Executor};
//!
//! let executor = Executor::new(&ExecutorConfig::default()).unwrap();
//! let sum = executor
//!     .region(|group| {
//!         let a = group.spawn(|| 1);
//!         let b = group.spawn(|| 2);
//!         group.barrier()?;
//!         Ok(a.join()? + b.join()?)
//!     })
//!     .unwrap();
//! assert_eq!(sum, 3);
//! ```
//!
//! Failure policy: a panicking task terminates only itself. The next barrier
//! still waits for all tasks and then reports the failure; region exit reports
//! any failure nobody observed.

/// Worker pool configuration.
pub mod config;
/// The fork-join executor.
///
/// Owns the worker pool and runs parallel regions. Inside a region, a
/// `TaskGroup` spawns tasks and issues barriers.
pub mod executor;
/// The fixed five-node graph and its work functions.
pub mod graph;
mod latch;
mod sync;
/// One-shot task handles and task failures.
pub mod task;
/// Sinks for human-readable progress lines.
pub mod trace;
/// Common types: task names and worker identities.
pub mod types;
