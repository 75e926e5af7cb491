use std::num::NonZeroUsize;

/// Settings for the executor's worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Number of worker threads. `0` means one per available hardware thread.
    pub num_threads: usize,
    /// Worker threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            thread_name_prefix: "taskgraph-worker".to_owned(),
        }
    }
}

impl ExecutorConfig {
    /// Override the pool size. `0` restores hardware-concurrency sizing.
    #[must_use]
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// The pool size actually used, never zero.
    #[must_use]
    pub fn resolved_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.num_threads
        }
    }
}
