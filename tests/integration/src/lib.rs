//! partialkey Integration Tests
//!
//! Exercise the balancer the way a dispatcher would:
//! - Many OS threads sharing one balancer
//! - Async tasks holding slots for a while before releasing
//!
//! Run with: cargo test --package partialkey-integration-tests

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::{run_tasks, run_threads, ThreadedRun};
