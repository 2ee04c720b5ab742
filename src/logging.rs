//! Tracing subscriber setup.

use std::path::Path;

use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "PANEL_SIM_LOG";

/// Log file name used when a log directory is configured.
const LOG_FILE: &str = "panel-sim.log";

/// Line format for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Builds the event filter: `PANEL_SIM_LOG`, then `RUST_LOG`, then `info`.
pub fn env_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to info");
            EnvFilter::new("info")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Installs the global tracing subscriber.
///
/// Logs go to stderr unless `config.directory` (or `fallback_dir`) is set, in
/// which case they are appended to a file through a non-blocking writer. The
/// returned guard must be held for the life of the process so buffered lines
/// are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(
    config: &LoggingConfig,
    fallback_dir: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let directory = config.directory.as_deref().or(fallback_dir);

    let (writer, guard) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = directory.is_none();

    let registry = tracing_subscriber::registry().with(env_filter());
    match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_ansi(ansi).with_writer(writer))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: LogFormat,
        }
        let w: Wrapper = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(w.format, LogFormat::Json);
        let w: Wrapper = toml::from_str("format = \"pretty\"").unwrap();
        assert_eq!(w.format, LogFormat::Pretty);
    }

    #[test]
    fn default_format_is_pretty() {
        assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);
    }
}
