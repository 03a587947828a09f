//! AlwaysDay Core - Fundamental types and primitives
//!
//! This crate defines the types shared by the clock-control engine:
//! - Time primitives (TimeOfDay, SimulatedMoment)
//! - The skip window and its defaults
//! - Error taxonomy

pub mod time;
pub mod window;
pub mod error;

pub use time::*;
pub use window::*;
pub use error::*;
