//! AlwaysDay Test Harness - deterministic hosts for the clock-control engine
//!
//! This crate provides:
//! - A simulated host clock with minute ticks and an advance log
//! - A host whose clock service appears late, or broken
//! - A virtual-time retry scheduler
//! - A day simulator for long-running and randomised scenarios

pub mod clock;
pub mod host;
pub mod scheduler;
pub mod simulator;

pub use clock::*;
pub use host::*;
pub use scheduler::*;
pub use simulator::*;
