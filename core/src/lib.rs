//! partialkey Core Library
//!
//! Partial Key Grouping load balancing for keyed work items:
//! - Seeded key hashing
//! - The two-choice balancer and its in-flight guards
//! - Configuration
//! - Load and distribution statistics
//! - Error types

pub mod balancer;
pub mod config;
pub mod errors;
pub mod guard;
pub mod hash;
pub mod stats;

pub use balancer::Balancer;
pub use config::{BalancerConfig, ReleasePolicy};
pub use errors::{Error, Result};
pub use guard::{OwnedSlotGuard, SlotGuard};
pub use stats::{Candidates, Distribution, LoadSnapshot};
