//! AlwaysDay Runtime - hosts the engine inside a server process
//!
//! This crate provides the glue around the clock-control engine:
//! - Plugin config file (load, validate, version, save)
//! - Logging setup
//! - Tokio-backed retry scheduling
//! - Plugin lifecycle hooks

pub mod error;
pub mod config;
pub mod logging;
pub mod scheduler;
pub mod plugin;

pub use error::*;
pub use config::*;
pub use logging::*;
pub use scheduler::*;
pub use plugin::*;
