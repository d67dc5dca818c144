//! # Storage Configuration
//!
//! Sizing for storage containers and the world, loaded once at startup
//! from TOML.
//!
//! ```toml
//! reserve_entities = 4096
//!
//! [storage]
//! block_capacity = 256
//! preallocate_blocks = 1
//! reserve = 1024
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;

use serde::Deserialize;

use crate::error::{StorageError, StorageResult};

/// Default number of slots per block.
pub const DEFAULT_BLOCK_CAPACITY: usize = 128;

/// Sizing of a single storage container.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Slots per block for block-backed storage.
    pub block_capacity: usize,
    /// Blocks allocated upfront; `0` keeps allocation lazy.
    pub preallocate_blocks: usize,
    /// Initial reservation for dense storage.
    pub reserve: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            preallocate_blocks: 0,
            reserve: 0,
        }
    }
}

impl StorageConfig {
    /// Checks the configuration for values the containers cannot honor.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidConfig`] for a zero block capacity.
    pub fn validate(&self) -> StorageResult<()> {
        if self.block_capacity == 0 {
            return Err(StorageError::InvalidConfig(
                "block_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sizing of a [`World`](crate::World).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Entity slots reserved upfront.
    pub reserve_entities: usize,
    /// Sizing shared by the world's component tables.
    pub storage: StorageConfig,
}

impl WorldConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| StorageError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            StorageError::InvalidConfig(format!("{}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded world configuration");
        Ok(config)
    }

    /// Checks the configuration for values the world cannot honor.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidConfig`] for invalid storage sizing.
    pub fn validate(&self) -> StorageResult<()> {
        self.storage.validate()
    }
}
