//! Sandbox contract consumed by the worker loop.
//!
//! Workers only depend on the [`Sandbox`] and [`SandboxProvider`] traits; the
//! Docker adapter in [`docker`] is the production implementation and tests
//! substitute scripted ones.

pub mod docker;
pub mod process;

use crate::config::types::Result;
use std::time::Duration;

/// Captured output of one command run inside a sandbox.
///
/// Streams are demultiplexed; `exit_code` is `None` when the process was
/// killed (by signal or by the exec deadline) before exiting on its own.
#[derive(Clone, Debug, Default)]
pub struct ExecOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// An isolated, network-privileged execution environment.
///
/// All operations block on the calling worker thread; the only concurrency in
/// this subsystem comes from running several workers in parallel.
pub trait Sandbox: Send {
    /// Stable identity for log correlation.
    fn id(&self) -> &str;

    /// Run a command inside the sandbox, killing it past `timeout`.
    fn exec(&mut self, command: &str, args: &[String], timeout: Duration) -> Result<ExecOutput>;

    /// Tear the environment down and bring it back up, ready for use.
    fn restart(&mut self) -> Result<()>;

    /// Destroy the environment. The sandbox must not be used afterwards.
    fn terminate(&mut self) -> Result<()>;
}

/// Factory shared by the dispatcher with every worker thread.
pub trait SandboxProvider: Send + Sync {
    /// Spawn a sandbox and block until it is ready for its first exec.
    fn spawn(&self) -> Result<Box<dyn Sandbox>>;
}
