//! Concurrency helper: run independent jobs on a bounded worker pool.

use anyhow::{Context, Result};
use rayon::prelude::*;

/// Run `f` over `jobs` with at most `width` workers and collect results in job order.
///
/// A fresh pool is built per call, so each bucket gets its own pool lifecycle and
/// the call returns only once every job has finished (or one failed fatally).
pub fn map_limited<T, U, F>(jobs: Vec<T>, width: usize, f: F) -> Result<Vec<U>>
where
    T: Send,
    U: Send,
    F: Sync + Send + Fn(T) -> Result<U>,
{
    if width <= 1 || jobs.len() <= 1 {
        return jobs.into_iter().map(f).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(width.min(jobs.len()))
        .thread_name(|i| format!("extract-{i}"))
        .build()
        .context("build worker pool")?;
    pool.install(|| jobs.into_par_iter().map(|job| f(job)).collect())
}
