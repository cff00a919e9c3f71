//! Store configuration
//!
//! Loaded from a TOML file or built in code. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! # Number of most recent block headers retained
//! max_mini_headers = 20
//!
//! # Directory for the snapshot file; omit for a purely in-memory store
//! data_path = "/var/lib/mesh"
//!
//! # Write a snapshot when the database is closed
//! flush_on_close = true
//! ```

use meshstore_core::{Error, Result};
use meshstore_durability::SNAPSHOT_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of retained mini headers
pub const DEFAULT_MAX_MINI_HEADERS: usize = 20;

/// Configuration for a [`Database`](crate::Database)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound on stored mini headers; older ones are evicted
    #[serde(default = "default_max_mini_headers")]
    pub max_mini_headers: usize,
    /// Directory holding the snapshot file, `None` for in-memory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    /// Write a snapshot on close
    #[serde(default = "default_flush_on_close")]
    pub flush_on_close: bool,
}

fn default_max_mini_headers() -> usize {
    DEFAULT_MAX_MINI_HEADERS
}

fn default_flush_on_close() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_mini_headers: DEFAULT_MAX_MINI_HEADERS,
            data_path: None,
            flush_on_close: true,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mini header bound
    pub fn max_mini_headers(mut self, max: usize) -> Self {
        self.max_mini_headers = max;
        self
    }

    /// Persist snapshots under `path`
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Enable or disable the snapshot on close
    pub fn flush_on_close(mut self, enabled: bool) -> Self {
        self.flush_on_close = enabled;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Full path of the snapshot file, if persistence is enabled
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_path
            .as_ref()
            .map(|dir| dir.join(SNAPSHOT_FILE_NAME))
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.max_mini_headers == 0 {
            return Err(Error::InvalidConfig(
                "max_mini_headers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
