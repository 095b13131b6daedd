//! Fixed-size worker pool for embarrassingly parallel sweeps.
//!
//! One task per key. Tasks share nothing mutable; results are gathered into a
//! key → result map in whatever order they complete. A failing or panicking
//! task is logged as soon as it fails and reported in `failures`; its siblings
//! always run to completion. There is no cancellation.

use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Successful results by key, plus the keys that failed and why.
#[derive(Debug)]
pub struct SweepOutcome<K, R> {
    pub results: HashMap<K, R>,
    pub failures: Vec<(K, String)>,
}

impl<K, R> SweepOutcome<K, R> {
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// A private pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("holdlab-sweep-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn run<K, R, E, F>(&self, keys: &[K], task: F) -> SweepOutcome<K, R>
    where
        K: Clone + Eq + Hash + Display + Send + Sync,
        R: Send,
        E: Display,
        F: Fn(&K) -> Result<R, E> + Sync,
    {
        let completed: Vec<(K, Result<R, String>)> = self.pool.install(|| {
            keys.par_iter()
                .map(|key| {
                    let outcome = match catch_unwind(AssertUnwindSafe(|| task(key))) {
                        Ok(Ok(r)) => Ok(r),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(panic) => Err(panic_message(panic.as_ref())),
                    };
                    if let Err(msg) = &outcome {
                        log::error!("task {key} failed: {msg}");
                    }
                    (key.clone(), outcome)
                })
                .collect()
        });

        let mut results = HashMap::with_capacity(completed.len());
        let mut failures = Vec::new();
        for (key, outcome) in completed {
            match outcome {
                Ok(r) => {
                    results.insert(key, r);
                }
                Err(msg) => failures.push((key, msg)),
            }
        }
        SweepOutcome { results, failures }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
