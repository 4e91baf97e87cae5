//! Store configuration
//!
//! Runtime configuration for opening a store, loadable from a TOML file with
//! environment variable overrides and validated before use.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for opening a [`Store`](crate::Store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// On-disk location of the store
    pub path: PathBuf,

    /// Bound on the open-time wait for the exclusive store lock, in
    /// milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Engine page cache capacity in bytes (engine default when unset)
    #[serde(default)]
    pub cache_capacity: Option<u64>,
}

fn default_lock_timeout_ms() -> u64 {
    1000
}

impl StoreConfig {
    /// Create a configuration with defaults for the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock_timeout_ms: default_lock_timeout_ms(),
            cache_capacity: None,
        }
    }

    /// Load configuration from a TOML file
    ///
    /// `CANOPY_*` environment variables override file values
    /// (e.g. `CANOPY_LOCK_TIMEOUT_MS=250`).
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self, StoreError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(file.as_ref()))
            .add_source(config::Environment::with_prefix("CANOPY"))
            .build()?;

        let loaded: StoreConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::ConfigError(
                "Store path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
