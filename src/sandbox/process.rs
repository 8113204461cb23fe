/// Blocking external-process execution with demultiplexed streams.
///
/// Stdout and stderr are drained on collector threads while the caller polls
/// the child with a deadline; a child that outlives the deadline is killed
/// and reaped. The deadline lives here so callers never block forever on a
/// wedged sandbox runtime.
use crate::config::types::{CaptureError, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use super::ExecOutput;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `program` to completion, returning exit code and both streams.
///
/// A spawn failure is an error; a timeout is not — the child is killed and
/// the partial output is returned with `exit_code: None` so the caller can
/// classify it like any other failed attempt.
pub fn run<S: AsRef<OsStr>>(program: &str, args: &[S], timeout: Duration) -> Result<ExecOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| CaptureError::Process(format!("failed to launch {program}: {err}")))?;

    let stdout_rx = spawn_collector(child.stdout.take());
    let stderr_rx = spawn_collector(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout)?;

    // Collectors finish once the child's pipe ends close; recv after reaping
    // cannot block indefinitely.
    let stdout = stdout_rx.recv().unwrap_or_default();
    let stderr = stderr_rx.recv().unwrap_or_default();

    Ok(ExecOutput {
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
    })
}

/// Poll the child until it exits or the deadline passes; `None` means the
/// deadline fired and the child was killed.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                return Err(CaptureError::Process(format!(
                    "failed to poll child process: {err}"
                )))
            }
        }

        if start.elapsed() >= timeout {
            log::warn!(
                "child process exceeded {}s deadline, killing",
                timeout.as_secs()
            );
            if let Err(err) = child.kill() {
                return Err(CaptureError::Process(format!(
                    "failed to kill timed-out child: {err}"
                )));
            }
            child
                .wait()
                .map_err(|err| CaptureError::Process(format!("failed to reap child: {err}")))?;
            return Ok(None);
        }

        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

fn spawn_collector<R: Read + Send + 'static>(stream: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = channel();
    match stream {
        Some(mut stream) => {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                // Read errors surface as truncated output, not a crash.
                let _ = stream.read_to_end(&mut buffer);
                let _ = tx.send(buffer);
            });
        }
        None => {
            let _ = tx.send(Vec::new());
        }
    }
    rx
}
