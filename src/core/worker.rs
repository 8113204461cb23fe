//! Per-worker execution and restart loop.
//!
//! A worker owns one sandbox for its whole life: it drains the shared queue,
//! runs the capture tool for each target, classifies what came back, and
//! hands good results to the store. Task-level failures are logged and
//! skipped; the only things that stop a worker are queue exhaustion and a
//! sandbox that cannot be (re)started.

use crate::config::types::{CaptureConfig, Result};
use crate::core::queue::WorkQueue;
use crate::sandbox::{ExecOutput, Sandbox};
use crate::store::record::CaptureRecord;
use crate::store::ResultStore;
use std::sync::Arc;

/// Outcome counters one worker reports back to the dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Targets taken from the queue
    pub attempted: u64,
    /// Results persisted to the corpus
    pub stored: u64,
    /// Capture tool exited non-zero or was killed
    pub exec_failures: u64,
    /// Exit zero but stdout was not a valid capture record
    pub decode_failures: u64,
    /// Well-formed record with `success: false`
    pub reported_failures: u64,
    /// Valid result that the store refused
    pub store_failures: u64,
    /// Sandbox restarts performed at the lifespan cadence
    pub restarts: u64,
}

impl WorkerReport {
    pub fn absorb(&mut self, other: &WorkerReport) {
        self.attempted += other.attempted;
        self.stored += other.stored;
        self.exec_failures += other.exec_failures;
        self.decode_failures += other.decode_failures;
        self.reported_failures += other.reported_failures;
        self.store_failures += other.store_failures;
        self.restarts += other.restarts;
    }
}

/// How one capture attempt resolved.
#[derive(Debug)]
enum Outcome {
    Captured(CaptureRecord),
    ReportedFailure,
    DecodeFailure { error: String, tail: String },
    ExecFailure { exit_code: Option<i32> },
}

/// Classify a capture-tool invocation.
///
/// A record that parses but reports `success: false` is the tool telling us
/// the page was not worth keeping; anything that fails to parse (including a
/// record with missing fields) is a decode failure.
fn classify(output: &ExecOutput) -> Outcome {
    if !output.success() {
        return Outcome::ExecFailure {
            exit_code: output.exit_code,
        };
    }
    match CaptureRecord::parse(&output.stdout) {
        Ok(record) if record.success => Outcome::Captured(record),
        Ok(_) => Outcome::ReportedFailure,
        Err(err) => Outcome::DecodeFailure {
            error: err.to_string(),
            tail: stdout_tail(&output.stdout),
        },
    }
}

/// Trailing fragment of stdout kept for diagnosing decode failures.
fn stdout_tail(stdout: &[u8]) -> String {
    let start = stdout.len().saturating_sub(100);
    String::from_utf8_lossy(&stdout[start..]).into_owned()
}

/// One worker: a sandbox plus the loop that drives it.
pub struct WorkerSupervisor {
    n: usize,
    sandbox: Box<dyn Sandbox>,
    config: Arc<CaptureConfig>,
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
}

impl WorkerSupervisor {
    pub fn new(
        n: usize,
        sandbox: Box<dyn Sandbox>,
        config: Arc<CaptureConfig>,
        queue: Arc<WorkQueue>,
        store: Arc<ResultStore>,
    ) -> Self {
        Self {
            n,
            sandbox,
            config,
            queue,
            store,
        }
    }

    /// Drain the queue, then reap the sandbox.
    ///
    /// Returns `Err` only for sandbox restart/teardown failures; every
    /// task-level failure is counted in the report and the loop continues.
    pub fn run(mut self) -> Result<WorkerReport> {
        let mut report = WorkerReport::default();

        while let Some(url) = self.queue.take() {
            report.attempted += 1;
            log::info!(
                "worker {} ({}) is capturing {}",
                self.n,
                self.sandbox.id(),
                url
            );
            self.attempt(&url, &mut report);

            // The counter ticks on every attempt, not only successes, so a
            // sandbox cannot dodge its restart by failing. Lifespan 0 means
            // never restart.
            if self.config.lifespan > 0 && report.attempted % self.config.lifespan == 0 {
                log::info!(
                    "worker {} has executed {} tasks and is restarting its sandbox",
                    self.n,
                    self.config.lifespan
                );
                self.sandbox.restart()?;
                report.restarts += 1;
            }
        }

        log::info!("worker {} found the queue empty, shutting down", self.n);
        self.sandbox.terminate()?;
        Ok(report)
    }

    fn attempt(&mut self, url: &str, report: &mut WorkerReport) {
        let args = capture_args(&self.config, url);
        let output = match self
            .sandbox
            .exec(&self.config.capture_tool, &args, self.config.exec_timeout())
        {
            Ok(output) => output,
            Err(err) => {
                log::warn!("worker {} could not exec capture of {}: {}", self.n, url, err);
                report.exec_failures += 1;
                return;
            }
        };

        match classify(&output) {
            Outcome::Captured(record) => {
                log::info!("successfully captured {}", url);
                match self.store.store(record) {
                    Ok(_) => report.stored += 1,
                    Err(err) => {
                        log::error!("worker {} failed to persist {}: {}", self.n, url, err);
                        report.store_failures += 1;
                    }
                }
            }
            Outcome::ReportedFailure => {
                log::info!("capture of {} failed for some reason", url);
                report.reported_failures += 1;
            }
            Outcome::DecodeFailure { error, tail } => {
                log::info!("{} produced undecodable output: {}", url, error);
                log::info!("stdout tail: {}", tail);
                report.decode_failures += 1;
            }
            Outcome::ExecFailure { exit_code } => {
                log::info!(
                    "worker {} failed to capture {} (exit code {:?})",
                    self.n,
                    url,
                    exit_code
                );
                report.exec_failures += 1;
            }
        }
    }
}

/// Arguments for one capture-tool invocation.
fn capture_args(config: &CaptureConfig, url: &str) -> Vec<String> {
    vec![
        "--url".to_string(),
        url.to_string(),
        "--width".to_string(),
        config.width.to_string(),
        "--height".to_string(),
        config.height.to_string(),
        "--timeout".to_string(),
        config.timeout.to_string(),
    ]
}
