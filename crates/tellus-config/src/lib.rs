//! Runtime configuration for the tessellation service.
//!
//! Settings persist to disk as RON files and deserialize with per-field
//! defaults, so configs written by older builds keep loading.

mod config;
mod error;

pub use config::{DebugConfig, OptimizationConfig, TellusConfig, WorkerConfig};
pub use error::ConfigError;
