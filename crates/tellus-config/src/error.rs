//! Error type for configuration loading and saving.

use thiserror::Error;

/// Errors that can occur while reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file exists but is not valid RON for this config version.
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The config could not be serialized (should not happen for valid
    /// structs; indicates a serializer bug).
    #[error("config serialize error: {0}")]
    Serialize(#[from] ron::Error),
}
