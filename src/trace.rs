use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

/// Destination of the human-readable progress lines (`Processing A, th=0`,
/// `A Done`, `e= 31`).
///
/// Lines are emitted concurrently from pool workers; each call must be
/// written atomically with respect to other calls.
pub trait TraceSink: Send + Sync {
    /// Emit one complete line, without trailing newline.
    fn emit(&self, line: &str);
}

/// Writes each line to standard output under the stdout lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn emit(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        // A closed stdout must not abort the run.
        let _ = writeln!(stdout, "{line}").and_then(|()| stdout.flush());
    }
}

/// Keeps every line in memory in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Position of the first line equal to `line`.
    #[must_use]
    pub fn position(&self, line: &str) -> Option<usize> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .position(|recorded| recorded == line)
    }
}

impl TraceSink for RecordingSink {
    fn emit(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}
