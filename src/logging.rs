//! Logging setup.
//!
//! The terminal UI owns stdout and stderr, so events go to a daily rolling file
//! instead of the console.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,evsearch=debug";

const LOG_FILE_PREFIX: &str = "evsearch.log";

/// Builds the level filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging to `log_dir/evsearch.log.YYYY-MM-DD`.
///
/// Keep the returned guard alive until the process exits; dropping it stops
/// the background writer and loses buffered events.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn default_filter_applies_without_rust_log() {
        let original = std::env::var("RUST_LOG").ok();
        unsafe { std::env::remove_var("RUST_LOG") };

        let filter = env_filter().to_string();

        if let Some(value) = original {
            unsafe { std::env::set_var("RUST_LOG", value) };
        }
        assert!(filter.contains("evsearch=debug"));
    }

    #[test]
    #[serial]
    fn rust_log_overrides_default_filter() {
        let original = std::env::var("RUST_LOG").ok();
        unsafe { std::env::set_var("RUST_LOG", "warn") };

        let filter = env_filter().to_string();

        match original {
            Some(value) => unsafe { std::env::set_var("RUST_LOG", value) },
            None => unsafe { std::env::remove_var("RUST_LOG") },
        }
        assert_eq!(filter, "warn");
    }
}
