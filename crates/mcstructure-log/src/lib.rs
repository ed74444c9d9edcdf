//! Structured logging for the mcstructure tooling.
//!
//! Installs a `tracing` subscriber with console output and, in debug builds, a JSON
//! log file for post-mortem analysis. The filter honours `RUST_LOG` first and the
//! configured log level second.

use std::path::Path;

use mcstructure_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written into `log_dir`.
pub const LOG_FILE_NAME: &str = "mcstructure.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether file logging may be enabled
/// * `config` - Optional configuration supplying the log level and file toggle
///
/// # Examples
///
/// ```no_run
/// use mcstructure_config::Config;
/// use mcstructure_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if file_logging_enabled(debug_build, config)
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Returns an [`EnvFilter`] built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// The JSON file layer is only installed in debug builds, and only when the
/// config (if any) leaves `file_logging` on.
fn file_logging_enabled(debug_build: bool, config: Option<&Config>) -> bool {
    debug_build && config.is_none_or(|c| c.logging.file_logging)
}

/// Picks the filter directive: the configured level, or the default when unset.
fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.logging.level.trim().is_empty() => config.logging.level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_filter_directive_without_config() {
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_filter_directive_from_config() {
        let mut config = Config::default();
        config.logging.level = "warn,mcstructure_voxel=trace".to_string();
        assert_eq!(filter_directive(Some(&config)), "warn,mcstructure_voxel=trace");
    }

    #[test]
    fn test_blank_level_falls_back() {
        let mut config = Config::default();
        config.logging.level = "  ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_file_logging_requires_debug_build() {
        assert!(file_logging_enabled(true, None));
        assert!(!file_logging_enabled(false, None));
        assert!(!file_logging_enabled(false, Some(&Config::default())));
    }

    #[test]
    fn test_file_logging_follows_config() {
        let mut config = Config::default();
        assert!(file_logging_enabled(true, Some(&config)));

        config.logging.file_logging = false;
        assert!(!file_logging_enabled(true, Some(&config)));
    }

    #[test]
    fn test_configured_directive_parses() {
        let mut config = Config::default();
        config.logging.level = "debug,mcstructure_voxel=trace".to_string();
        assert!(EnvFilter::try_new(filter_directive(Some(&config))).is_ok());
    }
}
