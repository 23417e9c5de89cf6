//! Configuration sections and persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Worker-pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads. `0` means "derive from the CPU count".
    pub worker_count: usize,
    /// Maximum number of requests queued or running at once.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            queue_capacity: 16,
        }
    }
}

/// Mesh post-processing toggles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Reorder triangle indices for vertex-cache locality before
    /// responding.
    pub optimize_vertex_cache: bool,
    /// Simulated post-transform cache size used by the optimizer.
    pub cache_size: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            optimize_vertex_cache: false,
            cache_size: 24,
        }
    }
}

/// Debugging and logging settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter directive (e.g. `"info"`, `"tellus_tessellate=debug"`).
    /// Empty means "use the built-in default".
    pub log_level: String,
}

/// Top-level configuration, persisted as RON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TellusConfig {
    /// Worker-pool settings.
    pub worker: WorkerConfig,
    /// Mesh post-processing toggles.
    pub optimization: OptimizationConfig,
    /// Debugging and logging settings.
    pub debug: DebugConfig,
}

impl TellusConfig {
    /// The conventional config location:
    /// `<platform config dir>/tellus/config.ron`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tellus").join("config.ron"))
    }

    /// Loads a config from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    /// Loads a config from `path`, falling back to defaults (with a
    /// warning) when the file is missing or unreadable.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(error) => {
                log::warn!("failed to load config from {}: {error}", path.display());
                Self::default()
            }
        }
    }

    /// Saves the config to `path` as pretty-printed RON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let config = TellusConfig::default();
        assert_eq!(config.worker.worker_count, 0);
        assert!(config.worker.queue_capacity > 0);
        assert_eq!(config.optimization.cache_size, 24);
        assert!(!config.optimization.optimize_vertex_cache);
    }

    #[test]
    fn test_round_trip_through_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");

        let mut config = TellusConfig::default();
        config.worker.worker_count = 4;
        config.optimization.optimize_vertex_cache = true;
        config.debug.log_level = "debug".to_string();

        config.save(&path).unwrap();
        let loaded = TellusConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.ron");
        let config = TellusConfig::load_or_default(&path);
        assert_eq!(config, TellusConfig::default());
    }

    #[test]
    fn test_partial_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ron");
        std::fs::write(&path, "(worker: (worker_count: 2))").unwrap();

        let config = TellusConfig::load(&path).unwrap();
        assert_eq!(config.worker.worker_count, 2);
        assert_eq!(config.worker.queue_capacity, 16, "default fills in");
        assert_eq!(config.optimization, OptimizationConfig::default());
    }
}
