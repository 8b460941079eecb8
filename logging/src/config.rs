//! Logging configuration and levels.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

use crate::LogError;

/// Severity, most verbose first.
///
/// Parses from the name (`warn`, `warning`, case-insensitive) or the
/// one-letter abbreviation used in log lines (`W`).
///
/// # Examples
///
/// ```
/// use gblibx_logging::LogLevel;
///
/// assert_eq!("w".parse::<LogLevel>().unwrap(), LogLevel::Warn);
/// assert_eq!("Debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
/// assert_eq!(LogLevel::Error.letter(), 'E');
/// assert!("loud".parse::<LogLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Abbreviation that prefixes every log line.
    pub fn letter(self) -> char {
        match self {
            Self::Trace => 'T',
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }

    /// Level for a repeated `-d` count: none shows warnings and errors, each
    /// `-d` one level more.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "trace" => Ok(Self::Trace),
            "d" | "debug" => Ok(Self::Debug),
            "i" | "info" => Ok(Self::Info),
            "w" | "warn" | "warning" => Ok(Self::Warn),
            "e" | "error" => Ok(Self::Error),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = LogError;

    fn try_from(s: String) -> Result<Self, LogError> {
        s.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::TRACE => Self::Trace,
            Level::DEBUG => Self::Debug,
            Level::INFO => Self::Info,
            Level::WARN => Self::Warn,
            _ => Self::Error,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Where and how much to log.
///
/// ```yaml
/// level: debug
/// console: true
/// file: run.log
/// append: false
/// filter: "gblibx_exec=trace"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Lowest level written to the destinations.
    pub level: LogLevel,
    /// Write to stderr.
    pub console: bool,
    /// Also write to this file.
    pub file: Option<PathBuf>,
    /// Append to `file` instead of truncating it.
    pub append: bool,
    /// Extra per-target directives, e.g. `gblibx_exec=trace,gblibx_yaap=off`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            file: None,
            append: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, LogError> {
        let content = fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, LogError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, append: bool) -> Self {
        self.file = Some(path.into());
        self.append = append;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::from(Level::WARN), LogLevel::Warn);
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
    }

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(9), LogLevel::Trace);
    }

    #[test]
    fn test_config_defaults_and_yaml() {
        let config = LogConfig::from_yaml("level: W\nfile: out.log\n").unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.console);
        assert_eq!(config.file.as_deref(), Some(Path::new("out.log")));
        assert!(!config.append);

        let err = LogConfig::from_yaml("level: chatty\n").unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = LogConfig::load(Path::new("/no/such/log.yaml")).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
        assert!(err.to_string().contains("/no/such/log.yaml"));
    }

    #[test]
    fn test_level_serializes_as_name() {
        let yaml = serde_yaml::to_string(&LogConfig::default()).unwrap();
        assert!(yaml.contains("level: info"));
    }
}
