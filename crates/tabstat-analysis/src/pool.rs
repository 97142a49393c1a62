//! Fixed-size worker pool for analysis runs

use crate::method::AnalysisMethod;
use crate::run_analysis;
use crate::types::AnalysisOutput;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tabstat_core::{Dataset, Error, Result};

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 4;

/// Runs analyses off the calling thread
///
/// Submissions beyond the worker count queue inside the pool. There is no
/// cancellation or timeout: every submission runs to completion or failure
/// and its callback is invoked exactly once, on a worker thread.
pub struct AnalysisPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl AnalysisPool {
    /// Pool with [`DEFAULT_WORKERS`] threads
    pub fn new() -> Result<Self> {
        Self::with_workers(DEFAULT_WORKERS)
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidParameter(
                "analysis pool needs at least one worker".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tabstat-analysis-{i}"))
            .build()
            .map_err(|e| Error::Computation(format!("Failed to create thread pool: {e}")))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue `method` on a snapshot of `data`
    ///
    /// A panic inside the analysis is reported to the callback as an error.
    pub fn submit<F>(&self, data: Dataset, method: AnalysisMethod, on_complete: F)
    where
        F: FnOnce(Result<AnalysisOutput>) + Send + 'static,
    {
        tracing::debug!(method = method.slug(), rows = data.n_rows(), "analysis submitted");
        self.pool.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| run_analysis(method, &data)))
                .unwrap_or_else(|_| {
                    Err(Error::Computation(format!("{method} panicked")))
                });
            on_complete(result);
        });
    }

    /// Run `method` on the pool and wait for it
    pub fn run_blocking(&self, data: &Dataset, method: AnalysisMethod) -> Result<AnalysisOutput> {
        self.pool.install(|| run_analysis(method, data))
    }
}

impl std::fmt::Debug for AnalysisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPool")
            .field("workers", &self.workers)
            .finish()
    }
}
