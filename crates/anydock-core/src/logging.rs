//! Structured logging bootstrap.
//!
//! Library crates only emit `tracing` events; binaries call [`init`] once at
//! startup to install a subscriber.
//!
//! Filter resolution order:
//! 1. [`LogConfig::filter`] when set explicitly.
//! 2. `RUST_LOG`.
//! 3. `ANYDOCK_LOG`.
//! 4. `"info"`.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Fallback filter directive when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Plain,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Logging options chosen by the binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Explicit `EnvFilter` directive; overrides the environment.
    #[serde(default)]
    pub filter: Option<String>,
}

impl LogConfig {
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Resolve the effective filter directive using `lookup` for environment access.
    #[must_use]
    pub fn resolve_filter(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            return filter.to_string();
        }
        ["RUST_LOG", "ANYDOCK_LOG"]
            .into_iter()
            .filter_map(&lookup)
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

/// Failures while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("logging is already initialized")]
    AlreadyInitialized,

    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Install the global `tracing` subscriber.
///
/// May be called once per process; later calls fail with
/// [`LoggingError::AlreadyInitialized`].
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggingError::AlreadyInitialized);
    }

    let directive = config.resolve_filter(|key| std::env::var(key).ok());
    let filter = match EnvFilter::try_new(&directive) {
        Ok(filter) => filter,
        Err(err) => {
            INITIALIZED.store(false, Ordering::SeqCst);
            return Err(LoggingError::InvalidFilter {
                filter: directive,
                message: err.to_string(),
            });
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Plain => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|err| {
        INITIALIZED.store(false, Ordering::SeqCst);
        LoggingError::Install(err.to_string())
    })?;

    tracing::debug!(message = "logging.init", filter = %directive, format = ?config.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LogConfig::default().with_filter("anydock=trace");
        let resolved = config.resolve_filter(env(&[("RUST_LOG", "warn")]));
        assert_eq!(resolved, "anydock=trace");
    }

    #[test]
    fn rust_log_before_anydock_log() {
        let config = LogConfig::default();
        let resolved =
            config.resolve_filter(env(&[("ANYDOCK_LOG", "debug"), ("RUST_LOG", "warn")]));
        assert_eq!(resolved, "warn");
    }

    #[test]
    fn blank_values_fall_through() {
        let config = LogConfig::default().with_filter("  ");
        let resolved =
            config.resolve_filter(env(&[("RUST_LOG", ""), ("ANYDOCK_LOG", "anydock=debug")]));
        assert_eq!(resolved, "anydock=debug");
        assert_eq!(LogConfig::default().resolve_filter(env(&[])), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn second_init_is_rejected() {
        let config = LogConfig::default().with_filter("off");
        init(&config).expect("first init installs the subscriber");
        assert!(matches!(init(&config), Err(LoggingError::AlreadyInitialized)));
    }
}
