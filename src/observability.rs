//! Logging configuration and the crate's structured baseline events.

use std::env;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::feed::FeedConfig;

const LEVEL_VAR: &str = "ALPHADASH_LOG_LEVEL";
const FORMAT_VAR: &str = "ALPHADASH_LOG_FORMAT";
const TARGET_VAR: &str = "ALPHADASH_LOG_TARGET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Build the logging configuration from `ALPHADASH_LOG_*` variables.
/// Unset, empty, or unparseable values fall back to the defaults rather
/// than failing startup.
pub fn logging_config_from_env() -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if let Some(level) = non_empty_env(LEVEL_VAR) {
        config.level = level;
    }

    match non_empty_env(FORMAT_VAR).map(|raw| raw.to_ascii_lowercase()) {
        Some(ref raw) if raw == "json" => config.format = LogFormat::Json,
        Some(ref raw) if raw == "pretty" => config.format = LogFormat::Pretty,
        _ => {}
    }

    if let Some(flag) = non_empty_env(TARGET_VAR).as_deref().and_then(parse_bool) {
        config.include_target = flag;
    }

    config
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter =
        EnvFilter::try_new(config.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_ansi(matches!(config.format, LogFormat::Pretty));

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    Ok(())
}

pub fn log_app_start(config: &LoggingConfig) {
    info!(
        component = "feed_watch",
        event = "app.start",
        log_level = %config.level,
        log_format = ?config.format,
        include_target = config.include_target
    );
}

pub fn log_feed_started(config: &FeedConfig) {
    info!(
        component = "feed_watch",
        event = "feed.started",
        endpoint = %config.endpoint_url,
        refresh_interval_ms = config.refresh_interval_ms,
        tick_interval_ms = config.tick_interval_ms
    );
}

fn non_empty_env(key: &str) -> Option<String> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let _guard = env_lock().lock().expect("env lock should not be poisoned");
        let previous: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| ((*key).to_string(), env::var(key).ok()))
            .collect();

        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        let output = f();

        for (key, value) in previous {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }

        output
    }

    #[test]
    fn missing_variables_yield_the_default_config() {
        let config = with_env(
            &[(LEVEL_VAR, None), (FORMAT_VAR, None), (TARGET_VAR, None)],
            logging_config_from_env,
        );

        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn level_format_and_target_come_from_env() {
        let config = with_env(
            &[
                (LEVEL_VAR, Some("debug")),
                (FORMAT_VAR, Some("JSON")),
                (TARGET_VAR, Some("off")),
            ],
            logging_config_from_env,
        );

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.include_target);
    }

    #[test]
    fn unparseable_format_and_target_keep_defaults() {
        let config = with_env(
            &[
                (LEVEL_VAR, Some("trace")),
                (FORMAT_VAR, Some("xml")),
                (TARGET_VAR, Some("perhaps")),
            ],
            logging_config_from_env,
        );

        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.include_target);
    }

    #[test]
    fn whitespace_only_values_are_treated_as_unset() {
        let config = with_env(
            &[
                (LEVEL_VAR, Some("   ")),
                (FORMAT_VAR, Some("")),
                (TARGET_VAR, None),
            ],
            logging_config_from_env,
        );

        assert_eq!(config, LoggingConfig::default());
    }
}
