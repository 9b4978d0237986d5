//! # Pool Configuration
//!
//! Sizing knobs for arenas and hash tables, loaded once at startup from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [arena]
//! region_capacity = 65536
//!
//! [table]
//! initial_buckets = 256
//! load_factor = 0.7
//! growth_factor = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Default bytes per arena region.
pub const DEFAULT_REGION_CAPACITY: usize = 64 * 1024;

/// Default bucket count of a new hash table.
pub const DEFAULT_BUCKETS: usize = 256;

/// Default fill ratio at which a hash table grows.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.7;

/// Default bucket-count multiplier applied on growth.
pub const DEFAULT_GROWTH_FACTOR: usize = 4;

/// Arena sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Capacity of the root region and of every chained page, in bytes.
    pub region_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            region_capacity: DEFAULT_REGION_CAPACITY,
        }
    }
}

/// Hash table sizing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Bucket count of a freshly created table.
    pub initial_buckets: usize,
    /// Fill ratio (`len / buckets`) at which the table grows.
    pub load_factor: f64,
    /// Bucket-count multiplier applied on growth.
    pub growth_factor: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
            load_factor: DEFAULT_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl TableConfig {
    /// Checks that the table can be built and grown with these values.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> PoolResult<()> {
        if self.initial_buckets == 0 {
            return Err(PoolError::InvalidConfig(
                "table.initial_buckets must be greater than zero".to_string(),
            ));
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(PoolError::InvalidConfig(format!(
                "table.load_factor must be in (0, 1], got {}",
                self.load_factor
            )));
        }
        if self.growth_factor < 2 {
            return Err(PoolError::InvalidConfig(format!(
                "table.growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Entry count at which a table of `buckets` buckets grows.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn grow_threshold(&self, buckets: usize) -> usize {
        (buckets as f64 * self.load_factor) as usize
    }
}

/// Complete pool configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Arena section.
    pub arena: ArenaConfig,
    /// Hash table section.
    pub table: TableConfig,
}

impl PoolConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the text does not parse or a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ConfigIo`] if the file cannot be read
    /// - [`PoolError::InvalidConfig`] if it does not parse or validate
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PoolError::ConfigIo(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> PoolResult<()> {
        if self.arena.region_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "arena.region_capacity must be greater than zero".to_string(),
            ));
        }
        self.table.validate()
    }
}
