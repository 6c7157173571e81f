//! # Workers
//!
//! A shared-memory worker pool for independent per-k-point evaluations. Results are gathered in
//! input order and the first error aborts the whole map.

use crate::error::BuildError;
use rayon::prelude::*;

/// The pool never has fewer workers than this
const MINIMUM_WORKERS: usize = 8;

/// A rayon pool which only splits work above a size threshold
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    parallel: bool,
    threshold: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.pool.current_num_threads())
            .field("parallel", &self.parallel)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// A quarter of the available cores, but at least `MINIMUM_WORKERS`
pub fn default_num_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 4).max(MINIMUM_WORKERS)
}

impl WorkerPool {
    /// Build a pool of `default_num_workers` threads
    ///
    /// Maps sized by `map_indices_sized` only run in parallel once their work size exceeds `threshold`.
    pub fn new(parallel: bool, threshold: usize) -> Result<Self, BuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(default_num_workers())
            .build()?;
        tracing::debug!(
            "Worker pool with {} threads, parallel: {parallel}",
            pool.current_num_threads()
        );
        Ok(Self {
            pool,
            parallel,
            threshold,
        })
    }

    /// A pool which evaluates everything on the calling thread
    pub fn sequential() -> Result<Self, BuildError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build()?;
        Ok(Self {
            pool,
            parallel: false,
            threshold: usize::MAX,
        })
    }

    /// Whether work may be split across threads
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Evaluate `f` for every index in `0..n`, in the pool whenever parallelism is enabled
    pub fn map_indices<R, E, F>(&self, n: usize, f: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(usize) -> Result<R, E> + Sync + Send,
    {
        if self.parallel {
            self.pool
                .install(|| (0..n).into_par_iter().map(&f).collect())
        } else {
            (0..n).map(f).collect()
        }
    }

    /// Evaluate `f` for every index in `0..n`, in the pool only if `work_size` exceeds the threshold
    pub fn map_indices_sized<R, E, F>(&self, n: usize, work_size: usize, f: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(usize) -> Result<R, E> + Sync + Send,
    {
        if self.parallel && work_size > self.threshold {
            self.pool
                .install(|| (0..n).into_par_iter().map(&f).collect())
        } else {
            (0..n).map(f).collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::{default_num_workers, WorkerPool};

    #[test]
    fn results_are_gathered_in_input_order() {
        let pool = WorkerPool::new(true, 0).unwrap();
        let squares: Result<Vec<usize>, ()> = pool.map_indices(1000, |i| Ok(i * i));
        assert_eq!(squares.unwrap(), (0..1000).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn the_first_failure_aborts_the_map() {
        let pool = WorkerPool::new(true, 0).unwrap();
        let result: Result<Vec<usize>, String> = pool.map_indices_sized(100, 1, |i| {
            if i == 42 {
                Err(format!("failed at {i}"))
            } else {
                Ok(i)
            }
        });
        assert_eq!(result.unwrap_err(), "failed at 42");
    }

    #[test]
    fn pools_have_at_least_eight_workers() {
        assert!(default_num_workers() >= 8);
    }
}
