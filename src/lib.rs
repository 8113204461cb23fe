//! webcap: concurrent dispatch of sandboxed web-capture workers
//!
//! A list of target URLs is spread across a bounded pool of ephemeral,
//! network-privileged sandbox containers. Each worker repeatedly takes a
//! target from the shared queue, runs the external capture tool inside its
//! sandbox, and persists usable results into an append-only corpus.
//!
//! # Architecture
//!
//! ## Core dispatch ([`core`])
//! - [`core::queue`]: shared exactly-once work queue
//! - [`core::worker`]: per-worker execution/restart loop and outcome counters
//! - [`core::dispatcher`]: fixed-size worker pool, join-all, run summary
//!
//! ## Sandbox ([`sandbox`])
//! - [`sandbox`]: the `Sandbox`/`SandboxProvider` contract workers consume
//! - [`sandbox::docker`]: Docker adapter (NET_ADMIN/NET_RAW, host PID mode)
//! - [`sandbox::process`]: blocking process execution with demuxed streams
//!   and a caller-supplied deadline
//!
//! ## Corpus ([`store`])
//! - [`store`]: serialized artifact writes plus the JSONL manifest
//! - [`store::record`]: the capture-tool wire record
//!
//! ## Plumbing
//! - [`config`]: immutable run configuration and error types
//! - [`input`]: CSV target loading and resume filtering
//! - [`cli`]: argument parsing and run assembly
//!
//! # Design principles
//!
//! 1. **One worker, one sandbox** - ownership never crosses threads
//! 2. **Blocking calls, parallel workers** - no async machinery
//! 3. **Failures are data** - task failures are counted and skipped,
//!    never escalated into aborting the run
//! 4. **The manifest never lies** - a manifest line is written only after
//!    every artifact it points at

// Core dispatch
pub mod core;

// Sandbox contract and adapters
pub mod sandbox;

// Corpus persistence
pub mod store;

// Configuration & errors
pub mod config;

// Input plumbing
pub mod input;

// CLI entrypoint wiring
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::{CaptureConfig, CaptureError, Result};
