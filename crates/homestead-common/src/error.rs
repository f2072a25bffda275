//! Error types for Homestead.

use thiserror::Error;

/// Top-level error type for Homestead operations.
#[derive(Debug, Error)]
pub enum HomesteadError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Chunk streaming errors
    #[error("Streaming error: {0}")]
    Stream(#[from] StreamError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Grid must hold at least one parcel
    #[error("Grid size must be at least 1, got {0}")]
    InvalidGridSize(u32),

    /// Chunk world size must be finite and positive
    #[error("Chunk world size must be finite and positive, got {0}")]
    InvalidChunkSize(f64),

    /// Hysteresis gap is missing
    #[error("Unload radius ({unload}) must exceed load radius ({load})")]
    RadiusOrder {
        /// Load radius
        load: u32,
        /// Unload radius
        unload: u32,
    },

    /// Global configuration was already set
    #[error("World config already installed")]
    AlreadyInstalled,

    /// TOML parse failure
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize failure
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// IO failure while reading or writing a config file
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chunk streaming errors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Streaming configuration rejected
    #[error("Invalid streaming config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Deferred build workers are gone
    #[error("Build workers disconnected")]
    WorkersDisconnected,
}

/// Result type alias for Homestead operations.
pub type HomesteadResult<T> = Result<T, HomesteadError>;
