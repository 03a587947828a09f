//! AlwaysDay Time Engine - keeps the simulated clock out of the night
//!
//! This crate implements the clock-control engine:
//! - Host boundary (clock service, time control, retry scheduler)
//! - Bounded-retry acquisition of the host time control
//! - Skip planning with day-boundary rollover
//! - Window controller evaluated on every simulated minute
//! - Engine lifecycle (start, reload, kill)

pub mod host;
pub mod acquire;
pub mod skip;
pub mod controller;
pub mod engine;

pub use host::*;
pub use acquire::*;
pub use skip::*;
pub use controller::*;
pub use engine::*;
