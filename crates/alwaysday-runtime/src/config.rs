//! Plugin configuration file
//!
//! JSON on disk, field names as operators know them from the plugin's
//! published config. Parsing of time values happens once, here; the engine
//! only ever sees a validated `SkipWindow`.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alwaysday_core::{AlwaysDayError, AlwaysDayResult, SkipWindow};
use alwaysday_time::AcquirePolicy;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Plugin version as stored in the config file
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionNumber {
    #[serde(rename = "Major")]
    pub major: u16,
    #[serde(rename = "Minor")]
    pub minor: u16,
    #[serde(rename = "Patch")]
    pub patch: u16,
}

impl VersionNumber {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        VersionNumber { major, minor, patch }
    }

    /// Version of this build
    pub fn current() -> Self {
        VersionNumber {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Skip window as written by operators
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSkipSettings {
    #[serde(rename = "Auto-skip start time")]
    pub start_time: String,
    #[serde(rename = "Auto-skip end time")]
    pub end_time: String,
    #[serde(rename = "Time to set after skip")]
    pub set_time: String,
}

impl Default for AutoSkipSettings {
    fn default() -> Self {
        AutoSkipSettings {
            start_time: "20:50".to_string(),
            end_time: "21:00".to_string(),
            set_time: "07:00".to_string(),
        }
    }
}

impl AutoSkipSettings {
    /// Parse the three times. Any failure swaps in all three defaults.
    pub fn resolve(&self) -> SkipWindow {
        match SkipWindow::parse(&self.start_time, &self.end_time, &self.set_time) {
            Ok(window) => window,
            Err(err) => {
                error!("{}", err);
                error!("Using default time values");
                SkipWindow::default()
            }
        }
    }
}

/// How patiently to wait for the host clock
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockLookupSettings {
    #[serde(rename = "Max attempts")]
    pub max_attempts: u32,
    /// humantime duration, e.g. `3s`, `500ms`
    #[serde(rename = "Retry interval")]
    pub retry_interval: String,
}

impl Default for ClockLookupSettings {
    fn default() -> Self {
        let policy = AcquirePolicy::default();
        ClockLookupSettings {
            max_attempts: policy.max_attempts,
            retry_interval: humantime::format_duration(policy.retry_interval).to_string(),
        }
    }
}

impl ClockLookupSettings {
    /// Acquisition policy; an unparsable interval falls back to the default
    pub fn policy(&self) -> AcquirePolicy {
        let default = AcquirePolicy::default();
        let retry_interval = match humantime::parse_duration(&self.retry_interval) {
            Ok(interval) if interval > Duration::ZERO => interval,
            Ok(_) => {
                warn!("Retry interval must be positive, using {:?}", default.retry_interval);
                default.retry_interval
            }
            Err(err) => {
                warn!(
                    "Invalid retry interval '{}': {}, using {:?}",
                    self.retry_interval, err, default.retry_interval
                );
                default.retry_interval
            }
        };
        AcquirePolicy {
            max_attempts: self.max_attempts,
            retry_interval,
        }
    }
}

/// Whole config file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(rename = "Auto-Skip Settings", default)]
    pub auto_skip: AutoSkipSettings,
    #[serde(rename = "Clock Lookup", default)]
    pub clock_lookup: ClockLookupSettings,
    #[serde(rename = "Version", default)]
    pub version: Option<VersionNumber>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            auto_skip: AutoSkipSettings::default(),
            clock_lookup: ClockLookupSettings::default(),
            version: Some(VersionNumber::current()),
        }
    }
}

impl PluginConfig {
    /// True if the file predates this build (or carries no version)
    pub fn is_outdated(&self) -> bool {
        self.version < Some(VersionNumber::current())
    }
}

/// Reads and writes the config file
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw read. `Ok(None)` when there is no file yet.
    pub fn read(&self) -> AlwaysDayResult<Option<PluginConfig>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AlwaysDayError::ConfigIo(format!("{}: {}", self.path.display(), e))),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AlwaysDayError::ConfigFormat(format!("{}: {}", self.path.display(), e)))
    }

    /// Write `config` as pretty JSON, creating parent directories
    pub fn save(&self, config: &PluginConfig) -> AlwaysDayResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AlwaysDayError::ConfigIo(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| AlwaysDayError::ConfigFormat(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| AlwaysDayError::ConfigIo(format!("{}: {}", self.path.display(), e)))
    }

    /// Load for use. Never fails:
    /// - no file: defaults, written out
    /// - broken file: defaults in memory, file left for the operator
    /// - outdated version: bumped and written back
    pub fn load(&self) -> PluginConfig {
        let mut config = match self.read() {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!(path = %self.path.display(), "Creating a new configuration file");
                PluginConfig::default()
            }
            Err(err) => {
                error!("Your configuration file contains an error. Using default configuration values.");
                error!("{}", err);
                return PluginConfig::default();
            }
        };

        if config.is_outdated() {
            config.version = Some(VersionNumber::current());
            warn!("Config update completed!");
        }

        if let Err(err) = self.save(&config) {
            error!("Failed to save configuration: {}", err);
        }
        config
    }
}
