//! Runtime error types

use alwaysday_core::AlwaysDayError;
use thiserror::Error;

/// Errors raised by the plugin runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] AlwaysDayError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Plugin not initialized: call init() first")]
    NotInitialized,
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
