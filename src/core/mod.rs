//! Concurrent dispatch and worker lifecycle.

pub mod dispatcher;
pub mod queue;
pub mod worker;
