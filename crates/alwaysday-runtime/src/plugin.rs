//! Plugin lifecycle - maps host hooks onto config loading and the engine

use std::path::PathBuf;
use std::sync::Arc;

use alwaysday_core::SkipWindow;
use alwaysday_time::{AlwaysDayEngine, ClockHost, EngineStatus, RetryScheduler};
use tracing::{debug, info};

use crate::{ConfigStore, PluginConfig, RuntimeError, RuntimeResult};

/// One loaded plugin instance.
///
/// Hook order: `init` -> `on_server_initialized` -> (`reload_config`)* -> `unload`.
pub struct AlwaysDayPlugin {
    store: ConfigStore,
    host: Arc<dyn ClockHost>,
    scheduler: Arc<dyn RetryScheduler>,
    config: Option<PluginConfig>,
    engine: Option<AlwaysDayEngine>,
}

impl AlwaysDayPlugin {
    pub fn new(
        config_path: impl Into<PathBuf>,
        host: Arc<dyn ClockHost>,
        scheduler: Arc<dyn RetryScheduler>,
    ) -> Self {
        AlwaysDayPlugin {
            store: ConfigStore::new(config_path),
            host,
            scheduler,
            config: None,
            engine: None,
        }
    }

    /// Load the config file
    pub fn init(&mut self) {
        self.config = Some(self.store.load());
    }

    /// Resolve the window and start the engine. A second call is a no-op.
    pub fn on_server_initialized(&mut self) -> RuntimeResult<()> {
        let config = self.config.as_ref().ok_or(RuntimeError::NotInitialized)?;
        if self.engine.is_some() {
            debug!("engine already running");
            return Ok(());
        }

        let window = config.auto_skip.resolve();
        let policy = config.clock_lookup.policy();
        info!(
            start = %window.start,
            end = %window.end,
            target = %window.target,
            max_attempts = policy.max_attempts,
            "starting AlwaysDay engine"
        );

        let engine = AlwaysDayEngine::new(
            Arc::clone(&self.host),
            Arc::clone(&self.scheduler),
            window,
            policy,
        );
        engine.start();
        self.engine = Some(engine);
        Ok(())
    }

    /// Re-read the config file and hand the new window to the engine.
    /// Lookup settings only apply to the next engine.
    pub fn reload_config(&mut self) -> RuntimeResult<SkipWindow> {
        if self.config.is_none() {
            return Err(RuntimeError::NotInitialized);
        }
        let config = self.store.load();
        let window = config.auto_skip.resolve();
        if let Some(engine) = &self.engine {
            engine.reload(window);
        }
        self.config = Some(config);
        Ok(window)
    }

    /// Kill the engine and drop the config. Safe at any point.
    pub fn unload(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.kill();
        }
        self.config = None;
    }

    pub fn config(&self) -> Option<&PluginConfig> {
        self.config.as_ref()
    }

    pub fn engine(&self) -> Option<&AlwaysDayEngine> {
        self.engine.as_ref()
    }

    pub fn status(&self) -> Option<EngineStatus> {
        self.engine.as_ref().map(AlwaysDayEngine::status)
    }
}

impl Drop for AlwaysDayPlugin {
    fn drop(&mut self) {
        self.unload();
    }
}
