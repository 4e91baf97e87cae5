//! Error types for the canopy collection store.

use crate::node::NodeKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Store-level errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Name conflict: {name:?} already exists as a {kind}")]
    NameConflict { name: String, kind: NodeKind },

    #[error("Not found: {0:?}")]
    NotFound(String),

    #[error("Timed out acquiring store lock at {path:?} after {timeout:?}")]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("Storage engine error: {0}")]
    Engine(#[from] sled::Error),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::ConfigError(err.to_string())
    }
}
