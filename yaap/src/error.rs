//! Error types for option registration and argument parsing.
//!
//! Two families are kept apart:
//!
//! - [`SchemaError`]: a malformed CLI surface (programmer error), reported
//!   when an option is registered with a [`Group`](crate::Group).
//! - [`ParseError`]: a bad command line (user error), reported by
//!   [`Parser::parse`](crate::Parser::parse). Option-level failures arrive as
//!   [`BadOption`] and are wrapped transparently.

use thiserror::Error;

/// Schema violations detected while building a CLI surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An option was declared without any alias.
    #[error("option must define at least one name")]
    MissingName,
    /// More than a short and a long alias were given.
    #[error("too many option names: {0}")]
    TooManyNames(String),
    /// An alias is empty or does not start with `-`.
    #[error("invalid option name: {0:?}")]
    InvalidName(String),
    /// With two aliases the first (short) one must be strictly shorter.
    #[error("short form must precede long form: {0}")]
    ShortNotFirst(String),
    /// Cardinality marker outside of `!?*+`.
    #[error("invalid cardinality marker: {0:?}")]
    InvalidCardinality(char),
    /// A default value was supplied for an option that takes no argument.
    #[error("{0}: default value requires an argument")]
    DefaultWithoutArgument(String),
    /// A flag without argument can only be optional and single.
    #[error("{0}: flag without argument must use '?' cardinality")]
    BinaryNotOptional(String),
    /// Two options in the same group share a canonical name.
    #[error("duplicate option in group: {0}")]
    DuplicateOption(String),
    /// Two options in the same group share a raw alias such as `-v`.
    #[error("duplicate option alias in group: {0}")]
    DuplicateAlias(String),
}

/// A single option rejected a value or an occurrence.
///
/// Displays as `<-o|--option>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{option}: {message}")]
pub struct BadOption {
    /// Display name of the offending option (`-o|--output`).
    pub option: String,
    /// What went wrong.
    pub message: String,
}

impl BadOption {
    pub(crate) fn new(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            message: message.into(),
        }
    }
}

/// Usage violations found while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Token starting with `-` that matches no registered option, or an
    /// option-looking token after positional arguments started.
    #[error("{0}: invalid option")]
    InvalidOption(String),
    /// Option takes a value but the command line ended.
    #[error("{0}: takes 1 argument")]
    MissingValue(String),
    /// Required option never supplied.
    #[error("{0}: option required")]
    RequiredOption(String),
    /// Option-level rejection (repeat, unexpected value, converter failure).
    #[error(transparent)]
    BadOption(#[from] BadOption),
    /// The parser already consumed a command line.
    #[error("arguments were already parsed")]
    AlreadyParsed,
}

impl ParseError {
    /// Display name of the option the error refers to, if any.
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::InvalidOption(name) | Self::MissingValue(name) | Self::RequiredOption(name) => {
                Some(name.as_str())
            }
            Self::BadOption(bad) => Some(bad.option.as_str()),
            Self::AlreadyParsed => None,
        }
    }
}
