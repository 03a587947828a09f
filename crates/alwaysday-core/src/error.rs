//! Error types for AlwaysDay

use std::time::Duration;

use thiserror::Error;

/// Core AlwaysDay errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlwaysDayError {
    // Clock acquisition errors
    #[error("Clock service not available yet (attempt {attempt})")]
    ClockServiceMissing { attempt: u32 },

    #[error("Failed to find clock service after {attempts} attempts ({}s). Plugin will not function.", .waited.as_secs())]
    AcquisitionExhausted { attempts: u32, waited: Duration },

    #[error("Could not fetch time control component. Plugin will not work without it.")]
    TimeControlMissing,

    // Configuration errors
    #[error("Invalid time format '{input}': {reason}")]
    InvalidTimeOfDay { input: String, reason: String },

    #[error("Config I/O error: {0}")]
    ConfigIo(String),

    #[error("Config format error: {0}")]
    ConfigFormat(String),
}

impl AlwaysDayError {
    /// Retrying may still succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AlwaysDayError::ClockServiceMissing { .. })
    }

    /// The engine must stay inert for the rest of the session
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AlwaysDayError::AcquisitionExhausted { .. } | AlwaysDayError::TimeControlMissing
        )
    }
}

/// Result type for AlwaysDay operations
pub type AlwaysDayResult<T> = Result<T, AlwaysDayError>;
