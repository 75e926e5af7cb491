use clap::{ArgAction, Parser};
use std::time::Duration;

/// Runs the A/B/C → f1 → f2 task graph on a worker pool and prints `e`.
#[derive(Parser, Debug)]
#[command(name = "taskgraph", version, about)]
pub(crate) struct Cli {
    /// Worker pool size. 0 uses one worker per hardware thread.
    #[arg(short, long, env = "TASKGRAPH_THREADS", default_value_t = 0)]
    pub(crate) threads: usize,

    /// Length of one delay unit in milliseconds. Stages sleep 4 to 7 units.
    #[arg(long, env = "TASKGRAPH_DELAY_UNIT_MS", default_value_t = 1000)]
    pub(crate) delay_unit_ms: u64,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub(crate) quiet: bool,
}

impl Cli {
    pub(crate) fn delay_unit(&self) -> Duration {
        Duration::from_millis(self.delay_unit_ms)
    }
}
