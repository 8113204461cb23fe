/// Docker adapter for the sandbox contract.
///
/// Containers are granted NET_ADMIN/NET_RAW so the capture tool can record
/// raw network traffic, and run in host PID mode with the dispatcher's PID as
/// their command argument so the worker image can watch that PID and exit if
/// the dispatcher dies.
use crate::config::types::{CaptureError, Result};
use crate::sandbox::{process, ExecOutput, Sandbox, SandboxProvider};
use std::thread;
use std::time::{Duration, Instant};

/// Deadline for docker control-plane commands (run/inspect/restart/rm).
const CONTROL_TIMEOUT: Duration = Duration::from_secs(120);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const READY_DEADLINE: Duration = Duration::from_secs(30);

/// Spawns capture-worker containers from a fixed image.
pub struct DockerProvider {
    image: String,
}

impl DockerProvider {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

fn run_args(image: &str, parent_pid: u32) -> Vec<String> {
    let pid = parent_pid.to_string();
    [
        "run",
        "-d",
        "--cap-add",
        "NET_ADMIN",
        "--cap-add",
        "NET_RAW",
        "--pid",
        "host",
        image,
        pid.as_str(),
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl SandboxProvider for DockerProvider {
    fn spawn(&self) -> Result<Box<dyn Sandbox>> {
        let args = run_args(&self.image, std::process::id());
        let output = process::run("docker", &args, CONTROL_TIMEOUT)?;
        if !output.success() {
            return Err(CaptureError::Sandbox(format!(
                "docker run failed for image {}: {}",
                self.image,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(CaptureError::Sandbox(
                "docker run produced no container id".to_string(),
            ));
        }

        let sandbox = DockerSandbox {
            id,
            terminated: false,
        };
        sandbox.wait_until_running()?;
        Ok(Box::new(sandbox))
    }
}

/// One running worker container.
pub struct DockerSandbox {
    id: String,
    terminated: bool,
}

impl DockerSandbox {
    /// Poll the container state until it reports running.
    ///
    /// Replaces the fixed post-spawn sleep: readiness is observed, not
    /// assumed, and a container that never comes up is a hard error.
    fn wait_until_running(&self) -> Result<()> {
        let start = Instant::now();
        loop {
            let output = process::run(
                "docker",
                &["inspect", "-f", "{{.State.Running}}", &self.id],
                CONTROL_TIMEOUT,
            )?;
            if output.success() && String::from_utf8_lossy(&output.stdout).trim() == "true" {
                return Ok(());
            }
            if start.elapsed() >= READY_DEADLINE {
                return Err(CaptureError::Sandbox(format!(
                    "container {} not running after {}s",
                    self.id,
                    READY_DEADLINE.as_secs()
                )));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }
}

impl Sandbox for DockerSandbox {
    fn id(&self) -> &str {
        &self.id
    }

    fn exec(&mut self, command: &str, args: &[String], timeout: Duration) -> Result<ExecOutput> {
        let mut exec_args = vec!["exec".to_string(), self.id.clone(), command.to_string()];
        exec_args.extend(args.iter().cloned());
        process::run("docker", &exec_args, timeout)
    }

    fn restart(&mut self) -> Result<()> {
        let output = process::run("docker", &["restart", &self.id], CONTROL_TIMEOUT)?;
        if !output.success() {
            return Err(CaptureError::Sandbox(format!(
                "failed to restart container {}: {}",
                self.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        self.wait_until_running()
    }

    fn terminate(&mut self) -> Result<()> {
        let output = process::run("docker", &["rm", "-f", &self.id], CONTROL_TIMEOUT)?;
        if !output.success() {
            return Err(CaptureError::Sandbox(format!(
                "failed to remove container {}: {}",
                self.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        self.terminated = true;
        Ok(())
    }
}

impl Drop for DockerSandbox {
    fn drop(&mut self) {
        // Safety net for workers that die mid-run; normal exits terminate
        // explicitly before dropping.
        if !self.terminated {
            if let Err(err) = self.terminate() {
                log::warn!("cleanup of container {} failed: {}", self.id, err);
            }
        }
    }
}
