// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Runs independent jobs (one per page) on a bounded thread pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Error;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{error, info};

/// Outcome of a whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    /// Labels of failed jobs, in input order.
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.total - self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs `work` for every job on a pool of `threads` workers (0 picks the
/// number of CPUs) and returns once all of them have finished.
///
/// A job that returns an error or panics is logged and counted; it never
/// stops the others.
pub fn run<T, L, F>(jobs: &[T], threads: usize, label: L, work: F) -> Result<BatchReport, Error>
where
    T: Sync,
    L: Fn(&T) -> String + Sync,
    F: Fn(&T) -> Result<(), Error> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("page-{i}"))
        .build()?;

    let total = jobs.len();
    let done = AtomicUsize::new(0);

    let failed = pool.install(|| {
        jobs.par_iter()
            .filter_map(|job| {
                let name = label(job);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(job)));
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;

                match outcome {
                    Ok(Ok(())) => {
                        info!("[{n}/{total}] {name} done");
                        None
                    }
                    Ok(Err(e)) => {
                        error!("[{n}/{total}] {name} failed: {e:#}");
                        Some(name)
                    }
                    Err(payload) => {
                        error!("[{n}/{total}] {name} panicked: {}", panic_message(&*payload));
                        Some(name)
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    Ok(BatchReport { total, failed })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
