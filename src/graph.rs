//! The fixed five-node task graph.
//!
//! ```text
//!   A (7u)   B (6u)   C (5u)
//!     |        \       /
//!     |       f1 (4u) = B + C
//!      \        /
//!      f2 (5u) = A + f1
//! ```
//!
//! A, B and C run as independent tasks. After a barrier, the region body
//! computes f1 and then f2 itself, on whichever worker runs the region.

use crate::{
    executor::{Executor, RegionError},
    trace::TraceSink,
    types::WorkerId,
};
use derive_more::Display;
use std::{thread, time::Duration};
use tracing::debug;

/// One node of the graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum Stage {
    #[display("A")]
    A,
    #[display("B")]
    B,
    #[display("C")]
    C,
    #[display("f1")]
    F1,
    #[display("f2")]
    F2,
}

impl Stage {
    /// Every stage, producers first.
    pub const ALL: [Self; 5] = [Self::A, Self::B, Self::C, Self::F1, Self::F2];

    /// Artificial execution time, in delay units.
    #[must_use]
    pub const fn delay_units(self) -> u32 {
        match self {
            Self::A => 7,
            Self::B => 6,
            Self::C | Self::F2 => 5,
            Self::F1 => 4,
        }
    }

    /// Whether the stage announces its completion.
    #[must_use]
    pub const fn reports_done(self) -> bool {
        matches!(self, Self::A | Self::B | Self::C)
    }
}

/// Sum of every stage's delay: the wall-clock cost of a fully sequential run.
#[must_use]
pub fn sequential_units() -> u32 {
    Stage::ALL.iter().map(|stage| stage.delay_units()).sum()
}

/// The work functions of the graph: deterministic values plus a fixed delay,
/// traced with the worker that runs them.
#[derive(Clone, Copy)]
pub struct Workload<'a> {
    unit: Duration,
    sink: &'a dyn TraceSink,
}

impl<'a> Workload<'a> {
    /// Stages sleep `unit` per delay unit and trace to `sink`.
    pub fn new(unit: Duration, sink: &'a dyn TraceSink) -> Self {
        Self { unit, sink }
    }

    fn run<T>(&self, stage: Stage, compute: impl FnOnce() -> T) -> T {
        let worker = WorkerId::current();
        self.sink.emit(&format!("Processing {stage}, th={worker}"));
        debug!(%stage, %worker, "stage started");
        thread::sleep(self.unit * stage.delay_units());
        let output = compute();
        if stage.reports_done() {
            self.sink.emit(&format!("{stage} Done"));
        }
        debug!(%stage, "stage finished");
        output
    }

    /// Produce `y`.
    pub fn a(&self) -> i32 {
        self.run(Stage::A, || 1)
    }

    /// Produce `v`.
    pub fn b(&self) -> i32 {
        self.run(Stage::B, || 10)
    }

    /// Produce `w`.
    pub fn c(&self) -> i32 {
        self.run(Stage::C, || 20)
    }

    /// Combine the results of B and C.
    pub fn f1(&self, v: i32, w: i32) -> i32 {
        self.run(Stage::F1, || v + w)
    }

    /// Combine the result of A with the output of `f1`.
    pub fn f2(&self, y: i32, x: i32) -> i32 {
        self.run(Stage::F2, || y + x)
    }
}

impl core::fmt::Debug for Workload<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Workload")
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

/// Execute the graph on `executor` and return `e`.
///
/// # Errors
/// If any stage panicked. The run stops at the first synchronization point
/// after the failure.
pub fn run(executor: &Executor, workload: Workload<'_>) -> Result<i32, RegionError> {
    executor.region(|group| {
        let y = group.spawn_named("A", move || workload.a());
        let v = group.spawn_named("B", move || workload.b());
        let w = group.spawn_named("C", move || workload.c());
        group.barrier()?;

        let x = workload.f1(v.join()?, w.join()?);
        Ok(workload.f2(y.join()?, x))
    })
}
