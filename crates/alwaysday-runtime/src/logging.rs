//! Logging setup for processes hosting the engine

use tracing_subscriber::EnvFilter;

use crate::{RuntimeError, RuntimeResult};

/// Logging configuration
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_directive: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Include the event target (module path)
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            default_directive: "info".to_string(),
            json: false,
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Structured output for log shippers
    pub fn json() -> Self {
        LoggingConfig {
            json: true,
            with_target: true,
            ..Self::default()
        }
    }

    /// `RUST_LOG` wins over the configured directive
    pub fn env_filter(&self) -> RuntimeResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .map_err(|e| RuntimeError::Logging(format!("bad directive '{}': {}", self.default_directive, e))),
        }
    }
}

/// Install the global subscriber.
/// Fails instead of panicking if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> RuntimeResult<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| RuntimeError::Logging(e.to_string()))
}
