use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while configuring logging.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
