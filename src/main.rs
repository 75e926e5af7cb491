//! `taskgraph`: runs the fixed A/B/C → f1 → f2 graph and prints `e= 31`.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use std::{
    io::{self, Write},
    time::Instant,
};
use taskgraph::{
    config::ExecutorConfig,
    executor::Executor,
    graph::{self, Workload},
    trace::StdoutSink,
};
use tracing::info;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet)?;

    let config = ExecutorConfig::default().with_num_threads(cli.threads);
    let executor = Executor::new(&config).context("cannot start the task graph")?;
    info!(
        threads = executor.num_threads(),
        delay_unit = ?cli.delay_unit(),
        "running task graph"
    );

    let sink = StdoutSink;
    let started = Instant::now();
    let e = graph::run(&executor, Workload::new(cli.delay_unit(), &sink))
        .context("task graph aborted")?;
    info!(elapsed = ?started.elapsed(), "task graph finished");

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "e= {e}")
        .and_then(|()| stdout.flush())
        .context("cannot write the result")?;
    Ok(())
}
