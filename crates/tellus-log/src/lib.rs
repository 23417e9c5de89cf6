//! Structured logging for the tessellation service.
//!
//! Span-based, filterable logging via the `tracing` ecosystem: console
//! output with timestamps and module paths, plus JSON file logging in debug
//! builds for post-mortem analysis. Integrates with [`TellusConfig`] for
//! runtime log level control.

use std::path::Path;

use tellus_config::TellusConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: `info` everywhere.
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing subscriber.
///
/// - Console output with timestamps, module paths, and severity levels.
/// - JSON file logging in debug builds when `log_dir` is given.
/// - `RUST_LOG` overrides everything; otherwise the config's
///   `debug.log_level` applies, then the built-in default.
///
/// Call once at startup; later calls fail silently because a global
/// subscriber is already installed.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&TellusConfig>) {
    let filter_str = config
        .map(|config| config.debug.log_level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true) // Worker threads are named.
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("tellus.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        let _ = subscriber.with(file_layer).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

/// An `EnvFilter` with the default filter string, for tests and embedders
/// that build their own subscriber.
#[must_use]
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
