/// Shared types for the webcap dispatcher
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Immutable configuration for one capture run.
///
/// Built once by the CLI layer and shared by reference with the dispatcher
/// and every worker; nothing mutates it after startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Root directory for the output corpus
    pub output: PathBuf,
    /// Viewport width passed to the capture tool
    pub width: u32,
    /// Viewport height passed to the capture tool
    pub height: u32,
    /// Number of worker sandboxes to run concurrently
    pub workers: usize,
    /// Page-load timeout handed to the capture tool (seconds)
    pub timeout: u64,
    /// Sandbox image identity for worker containers
    pub image: String,
    /// Executions per sandbox before it is restarted
    pub lifespan: u64,
    /// Name of the capture executable inside the sandbox
    pub capture_tool: String,
}

impl CaptureConfig {
    /// Deadline enforced on one capture-tool invocation.
    ///
    /// The page-load timeout is enforced by the tool itself; the margin on
    /// top covers tool startup and result serialization inside the sandbox.
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout + 30)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./out"),
            width: 1024,
            height: 1024,
            workers: 1,
            timeout: 60,
            image: "webcap/worker".to_string(),
            lifespan: 10,
            capture_tool: "webcap-scrape".to_string(),
        }
    }
}

/// Custom error types for webcap
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Manifest encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for webcap operations
pub type Result<T> = std::result::Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_timeout_exceeds_tool_timeout() {
        let config = CaptureConfig {
            timeout: 60,
            ..CaptureConfig::default()
        };
        assert!(config.exec_timeout() > Duration::from_secs(60));
    }
}
