//! Logging to the console and an optional file in the gblibx line format.
//!
//! [`build`] assembles a `tracing-subscriber` registry from a [`LogConfig`]:
//!
//! - a stderr layer when `console` is set,
//! - a file layer when `file` is set (truncated unless `append`),
//! - a counting layer feeding the returned [`LogHandle`].
//!
//! Both output layers are filtered by `level` (plus optional per-target
//! `filter` directives); the counting layer sees every event.
//!
//! # Example
//!
//! ```
//! use gblibx_logging::{LogConfig, LogLevel};
//!
//! let config = LogConfig::default().with_level(LogLevel::Warn);
//! let (subscriber, handle) = gblibx_logging::build(&config).unwrap();
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!("not written, still counted");
//!     tracing::warn!(free_mb = 12, "disk almost full");
//! });
//! assert_eq!(handle.count(LogLevel::Info), 1);
//! assert_eq!(handle.problems(), 1);
//! ```

mod config;
mod counter;
mod error;
mod format;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub use config::{LogConfig, LogLevel};
pub use counter::LogHandle;
pub use error::LogError;
pub use format::{GbxFormat, format_ddhhmmss, format_hhmmss, format_line, format_timestamp};

fn level_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let builder =
        EnvFilter::builder().with_default_directive(LevelFilter::from(config.level).into());
    Ok(match config.filter.as_deref() {
        Some(directives) => builder.parse(directives)?,
        None => builder.parse_lossy(""),
    })
}

/// Builds a subscriber for `config` without installing it.
///
/// # Errors
///
/// [`LogError::OpenFile`] when the log file cannot be opened and
/// [`LogError::Filter`] for malformed `filter` directives.
pub fn build(
    config: &LogConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle), LogError> {
    let handle = LogHandle::new();

    let console = if config.console {
        Some(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .event_format(GbxFormat)
                .with_filter(level_filter(config)?),
        )
    } else {
        None
    };

    let file = match &config.file {
        Some(path) => {
            let out = OpenOptions::new()
                .create(true)
                .write(true)
                .append(config.append)
                .truncate(!config.append)
                .open(path)
                .map_err(|source| LogError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(out))
                    .with_ansi(false)
                    .event_format(GbxFormat)
                    .with_filter(level_filter(config)?),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(handle.layer());
    Ok((subscriber, handle))
}

/// Builds and installs the global subscriber.
///
/// # Errors
///
/// Everything [`build`] reports, plus [`LogError::Init`] when a global
/// subscriber is already set.
pub fn init(config: &LogConfig) -> Result<LogHandle, LogError> {
    let (subscriber, handle) = build(config)?;
    subscriber.try_init()?;
    tracing::debug!(level = %config.level, file = ?config.file, "logging initialized");
    Ok(handle)
}
