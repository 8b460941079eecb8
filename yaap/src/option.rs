//! Option schema and runtime value container.
//!
//! An [`Opt`] is both the declaration of a command-line option (aliases,
//! value name, cardinality, default, converter) and the container its values
//! accumulate into while a [`Parser`](crate::Parser) runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BadOption, SchemaError};
use crate::value::{Converter, Value};

/// How often an option may, or must, occur.
///
/// Each variant corresponds to one marker character.
///
/// # Examples
///
/// ```
/// use gblibx_yaap::Cardinality;
///
/// let c = Cardinality::from_marker('+').unwrap();
/// assert_eq!(c, Cardinality::RequiredRepeated);
/// assert!(c.is_required() && c.is_repeated());
/// assert!(Cardinality::from_marker('x').is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    /// `!`: exactly once.
    RequiredSingle,
    /// `?`: at most once (the default).
    #[default]
    OptionalSingle,
    /// `*`: any number of times.
    OptionalRepeated,
    /// `+`: at least once.
    RequiredRepeated,
}

impl Cardinality {
    /// Parses a marker character.
    pub fn from_marker(marker: char) -> Result<Self, SchemaError> {
        match marker {
            '!' => Ok(Self::RequiredSingle),
            '?' => Ok(Self::OptionalSingle),
            '*' => Ok(Self::OptionalRepeated),
            '+' => Ok(Self::RequiredRepeated),
            other => Err(SchemaError::InvalidCardinality(other)),
        }
    }

    /// The marker character for this cardinality.
    pub fn marker(self) -> char {
        match self {
            Self::RequiredSingle => '!',
            Self::OptionalSingle => '?',
            Self::OptionalRepeated => '*',
            Self::RequiredRepeated => '+',
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Self::RequiredSingle | Self::RequiredRepeated)
    }

    pub fn is_repeated(self) -> bool {
        matches!(self, Self::OptionalRepeated | Self::RequiredRepeated)
    }
}

impl TryFrom<char> for Cardinality {
    type Error = SchemaError;

    fn try_from(marker: char) -> Result<Self, Self::Error> {
        Self::from_marker(marker)
    }
}

/// A command-line option: schema plus accumulated values.
///
/// Built with [`Opt::new`] (a binary flag) and the chaining methods;
/// registering it with a [`Group`](crate::Group) runs [`Opt::check`].
///
/// # Examples
///
/// ```
/// use gblibx_yaap::{Cardinality, Opt};
///
/// let mut tag = Opt::new("-t|--tag", "Tag to apply")
///     .with_arg("tag")
///     .with_cardinality(Cardinality::OptionalRepeated);
/// assert_eq!(tag.canonical_name(), "tag");
/// assert_eq!(tag.to_string(), "[-t|--tag tag]...");
///
/// tag.add_value("x").unwrap();
/// tag.add_value("y").unwrap();
/// assert_eq!(tag.strings(), vec!["x", "y"]);
/// ```
#[derive(Clone)]
pub struct Opt {
    aliases: Vec<String>,
    arg_name: Option<String>,
    default: Option<Value>,
    description: String,
    cardinality: Cardinality,
    converter: Option<Converter>,
    values: Vec<Value>,
}

impl Opt {
    /// Creates an optional binary flag from `names` (`-v` or `-v|--verbose`).
    pub fn new(names: &str, description: &str) -> Self {
        Self {
            aliases: names
                .split('|')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect(),
            arg_name: None,
            default: None,
            description: description.to_string(),
            cardinality: Cardinality::OptionalSingle,
            converter: None,
            values: Vec::new(),
        }
    }

    /// Makes the option consume the next token; `value_name` labels it in
    /// usage text.
    pub fn with_arg(mut self, value_name: &str) -> Self {
        self.arg_name = Some(value_name.to_string());
        self
    }

    /// Sets the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Sets the cardinality from a marker character (`!?*+`).
    pub fn repeat(self, marker: char) -> Result<Self, SchemaError> {
        Ok(self.with_cardinality(Cardinality::from_marker(marker)?))
    }

    /// Value reported when the option takes an argument but was never given.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Converter applied to every raw value.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Verifies the schema invariants of this option.
    pub fn check(&self) -> Result<(), SchemaError> {
        match self.aliases.len() {
            0 => return Err(SchemaError::MissingName),
            1 | 2 => {}
            _ => return Err(SchemaError::TooManyNames(self.display_name())),
        }
        if let Some(bad) = self
            .aliases
            .iter()
            .find(|a| !a.starts_with('-') || a.trim_start_matches('-').is_empty())
        {
            return Err(SchemaError::InvalidName(bad.clone()));
        }
        if self.aliases.len() == 2 && self.aliases[0].len() >= self.aliases[1].len() {
            return Err(SchemaError::ShortNotFirst(self.display_name()));
        }
        if self.default.is_some() && !self.takes_arg() {
            return Err(SchemaError::DefaultWithoutArgument(self.display_name()));
        }
        if !self.takes_arg() && self.cardinality != Cardinality::OptionalSingle {
            return Err(SchemaError::BinaryNotOptional(self.display_name()));
        }
        Ok(())
    }

    /// All aliases as declared.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether `token` is one of this option's aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.aliases.iter().any(|a| a == token)
    }

    /// Stable lookup key: the long alias (or the only alias) without its
    /// leading dashes.
    pub fn canonical_name(&self) -> &str {
        self.aliases
            .last()
            .map(|a| a.trim_start_matches('-'))
            .unwrap_or("")
    }

    /// Aliases joined by `|`, as shown in messages and usage.
    pub fn display_name(&self) -> String {
        self.aliases.join("|")
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arg_name(&self) -> Option<&str> {
        self.arg_name.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether the option consumes a following value token.
    pub fn takes_arg(&self) -> bool {
        self.arg_name.is_some()
    }

    /// Optional flag without an argument.
    pub fn is_binary(&self) -> bool {
        !self.takes_arg() && self.cardinality == Cardinality::OptionalSingle
    }

    pub fn is_required(&self) -> bool {
        self.cardinality.is_required()
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality.is_repeated()
    }

    /// Whether at least one value was accumulated.
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    fn bad(&self, message: impl Into<String>) -> BadOption {
        BadOption::new(self.display_name(), message)
    }

    /// Records one occurrence with a value.
    pub fn add_value(&mut self, raw: &str) -> Result<(), BadOption> {
        if !self.takes_arg() {
            return Err(self.bad(format!("unexpected argument: {raw}")));
        }
        if !self.is_repeated() && self.has_values() {
            return Err(self.bad(format!("< 1 occurrence at: {raw}")));
        }
        let value = match &self.converter {
            Some(convert) => {
                convert(raw).map_err(|msg| self.bad(format!("invalid argument: {msg}")))?
            }
            None => Value::Str(raw.to_string()),
        };
        self.values.push(value);
        Ok(())
    }

    /// Records one occurrence of a binary flag.
    pub fn set_binary(&mut self) -> Result<(), BadOption> {
        if self.takes_arg() {
            return Err(self.bad("takes 1 argument"));
        }
        if self.has_values() {
            return Err(self.bad("option already specified"));
        }
        self.values.push(Value::Bool(true));
        Ok(())
    }

    /// `true` unless the option is required and has no value.
    pub fn is_required_met(&self) -> bool {
        !self.is_required() || self.has_values()
    }

    /// Values accumulated from the command line, in encounter order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Accumulated values, else the default, else `false` for a binary flag.
    pub fn effective_values(&self) -> Vec<Value> {
        if self.has_values() {
            self.values.clone()
        } else if let Some(default) = &self.default {
            vec![default.clone()]
        } else if self.is_binary() {
            vec![Value::Bool(false)]
        } else {
            Vec::new()
        }
    }

    /// The single effective value.
    ///
    /// Fails when a repeated option accumulated more than one value.
    pub fn scalar(&self) -> Result<Option<Value>, BadOption> {
        let mut values = self.effective_values();
        if values.len() > 1 {
            return Err(self.bad(format!("expected 1 value, found {}", values.len())));
        }
        Ok(values.pop())
    }

    /// Scalar value rendered as a string.
    pub fn as_string(&self) -> Result<Option<String>, BadOption> {
        Ok(self.scalar()?.map(|v| v.to_string()))
    }

    /// Scalar value as an integer; raw strings are parsed.
    pub fn as_int(&self) -> Result<Option<i64>, BadOption> {
        match self.scalar()? {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(n)),
            Some(Value::Str(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.bad(format!("not an integer: {s}"))),
            Some(other) => Err(self.bad(format!("not an integer: {other}"))),
        }
    }

    /// Scalar value as a float; integers and raw strings are accepted.
    pub fn as_float(&self) -> Result<Option<f64>, BadOption> {
        match self.scalar()? {
            None => Ok(None),
            Some(Value::Str(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.bad(format!("not a number: {s}"))),
            Some(other) => other
                .as_float()
                .map(Some)
                .ok_or_else(|| self.bad(format!("not a number: {other}"))),
        }
    }

    /// Scalar value as a boolean.
    pub fn as_bool(&self) -> Result<Option<bool>, BadOption> {
        match self.scalar()? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(self.bad(format!("not a boolean: {other}"))),
        }
    }

    /// Every effective value rendered as a string.
    pub fn strings(&self) -> Vec<String> {
        self.effective_values()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Whether a binary flag was set.
    pub fn is_true(&self) -> bool {
        self.is_binary() && self.values.first() == Some(&Value::Bool(true))
    }

    /// `-o|--output FILE`: the left column of detailed usage.
    pub fn detailed_args(&self) -> String {
        let mut buf = self.display_name();
        if let Some(arg) = &self.arg_name {
            buf.push(' ');
            buf.push_str(arg);
        }
        buf
    }

    /// Detailed usage line with the description starting at column `justify`
    /// (at least two spaces after the arguments).
    pub fn detailed_usage(&self, justify: usize) -> String {
        let args = self.detailed_args();
        let padding = justify.saturating_sub(args.len()).max(2);
        format!("{args}{}{}", " ".repeat(padding), self.description)
    }
}

/// Short usage syntax, e.g. `[-o|--out FILE]` or `-n|--name NAME`.
impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.detailed_args();
        if self.is_binary() {
            return write!(f, "[{args}]");
        }
        match self.cardinality {
            Cardinality::OptionalSingle => write!(f, "[{args}]"),
            Cardinality::OptionalRepeated => write!(f, "[{args}]..."),
            Cardinality::RequiredSingle => f.write_str(&args),
            Cardinality::RequiredRepeated => write!(f, "{args} [{args}]..."),
        }
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("aliases", &self.aliases)
            .field("arg_name", &self.arg_name)
            .field("default", &self.default)
            .field("cardinality", &self.cardinality)
            .field("converter", &self.converter.is_some())
            .field("values", &self.values)
            .finish()
    }
}
