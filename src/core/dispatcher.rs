//! Fixed-size dispatch of workers over a shared queue.
//!
//! Workers are created once, up to the configured count but never more than
//! there are targets, and the run simply waits for all of them. There is no
//! rebalancing and no global deadline: a worker that finishes early exits,
//! and the run ends when the last worker has drained the queue.

use crate::config::types::{CaptureConfig, CaptureError, Result};
use crate::core::queue::WorkQueue;
use crate::core::worker::{WorkerReport, WorkerSupervisor};
use crate::sandbox::SandboxProvider;
use crate::store::ResultStore;
use std::sync::Arc;
use std::thread;

/// Aggregated outcome of one full run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Summed counters from workers that completed normally
    pub report: WorkerReport,
    /// Workers started
    pub workers: usize,
    /// Workers lost to sandbox spawn/restart failures
    pub failed_workers: usize,
}

/// Load the queue, run `min(workers, targets)` workers to completion, and
/// aggregate their reports.
///
/// Sandbox spawn happens on the worker's own thread, so one slow container
/// start does not serialize the others. A worker that fails to spawn or
/// restart its sandbox is counted in `failed_workers` and logged; it never
/// aborts the rest of the run.
pub fn dispatch(
    targets: Vec<String>,
    provider: Arc<dyn SandboxProvider>,
    config: Arc<CaptureConfig>,
    store: Arc<ResultStore>,
) -> Result<RunSummary> {
    let queue = Arc::new(WorkQueue::new(targets));
    let worker_count = config.workers.min(queue.len());
    log::info!(
        "dispatching {} workers over {} targets",
        worker_count,
        queue.len()
    );

    let mut handles = Vec::with_capacity(worker_count);
    for n in 1..=worker_count {
        let provider = Arc::clone(&provider);
        let config = Arc::clone(&config);
        let queue = Arc::clone(&queue);
        let store = Arc::clone(&store);

        let handle = thread::Builder::new()
            .name(format!("worker-{n}"))
            .spawn(move || -> Result<WorkerReport> {
                let sandbox = provider.spawn()?;
                WorkerSupervisor::new(n, sandbox, config, queue, store).run()
            })
            .map_err(|err| {
                CaptureError::Process(format!("failed to spawn worker thread {n}: {err}"))
            })?;
        handles.push((n, handle));
    }

    let mut summary = RunSummary {
        workers: worker_count,
        ..RunSummary::default()
    };
    for (n, handle) in handles {
        match handle.join() {
            Ok(Ok(report)) => summary.report.absorb(&report),
            Ok(Err(err)) => {
                log::error!("worker {} died: {}", n, err);
                summary.failed_workers += 1;
            }
            Err(_) => {
                log::error!("worker {} panicked", n);
                summary.failed_workers += 1;
            }
        }
    }

    Ok(summary)
}
