//! World configuration.
//!
//! Holds the process-wide constants the generators and the streaming cache
//! read: parcel grid size, chunk world size, and the load/unload radii.
//! Configuration can be loaded from and saved to a TOML file, and installed
//! once per process with [`WorldConfig::install`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::error::ConfigError;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "homestead.toml";

/// Installed process-wide configuration.
static GLOBAL: OnceLock<WorldConfig> = OnceLock::new();

/// World configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === Parcels ===
    /// Side length of the square parcel grid
    pub grid_size: u32,
    /// Base parcel price before distance, growth, scarcity, and hoarding factors
    pub base_price: u32,

    // === Zoning ===
    /// Side length of the zone table built by the noisy generator
    pub zone_table_size: u32,

    // === Streaming ===
    /// World units covered by one chunk edge
    pub chunk_world_size: f64,
    /// Chunks within this Chebyshev distance of the viewer are loaded
    pub load_radius: u32,
    /// Loaded chunks beyond this Chebyshev distance are disposed
    pub unload_radius: u32,
    /// Never stream chunks with a negative X or Z index
    pub skip_negative_chunks: bool,

    // === Content ===
    /// Seed for chunk ground noise
    pub world_seed: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            base_price: 500,
            zone_table_size: 48,
            chunk_world_size: 16.0,
            load_radius: 3,
            unload_radius: 6,
            skip_negative_chunks: true,
            world_seed: 12345,
        }
    }
}

impl WorldConfig {
    /// Checks the invariants every consumer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if !self.chunk_world_size.is_finite() || self.chunk_world_size <= 0.0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_world_size));
        }
        if self.unload_radius <= self.load_radius {
            return Err(ConfigError::RadiusOrder {
                load: self.load_radius,
                unload: self.unload_radius,
            });
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Saves configuration to a TOML file, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        info!("Saved world config to {}", path.display());
        Ok(())
    }

    /// Installs this configuration process-wide.
    ///
    /// Only the first successful install takes effect.
    pub fn install(self) -> Result<&'static Self, ConfigError> {
        self.validate()?;
        let summary = format!(
            "grid={} chunk={} load={} unload={}",
            self.grid_size, self.chunk_world_size, self.load_radius, self.unload_radius
        );
        GLOBAL
            .set(self)
            .map_err(|_| ConfigError::AlreadyInstalled)?;
        info!("Installed world config: {summary}");
        Ok(Self::global())
    }

    /// Returns the installed configuration, or the defaults when none was installed.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::default)
    }
}
