//! Option values and value converters.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A value accumulated by an option.
///
/// Raw command-line values are stored as [`Value::Str`]; converters may turn
/// them into any other variant.
///
/// # Examples
///
/// ```
/// use gblibx_yaap::Value;
///
/// let v = Value::from("out.txt");
/// assert_eq!(v.as_str(), Some("out.txt"));
/// assert_eq!(Value::Int(3).to_string(), "3");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean (set binary flags).
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Raw or unconverted string.
    Str(String),
}

impl Value {
    /// Returns the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer payload.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float payload; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Converts a raw command-line string into a [`Value`].
///
/// `Err` carries a human-readable reason that ends up in the
/// [`BadOption`](crate::BadOption) message.
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Built-in converters.
pub mod convert {
    use std::sync::Arc;

    use super::{Converter, Value};

    /// Wraps a closure as a [`Converter`].
    pub fn from_fn<F>(f: F) -> Converter
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    /// Parses a signed integer.
    ///
    /// ```
    /// use gblibx_yaap::{convert, Value};
    ///
    /// let conv = convert::integer();
    /// assert_eq!(conv("42"), Ok(Value::Int(42)));
    /// assert!(conv("forty").is_err());
    /// ```
    pub fn integer() -> Converter {
        from_fn(|raw| {
            raw.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("expected integer, got {raw:?}"))
        })
    }

    /// Parses a floating point number.
    pub fn float() -> Converter {
        from_fn(|raw| {
            raw.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("expected number, got {raw:?}"))
        })
    }

    /// Parses `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive).
    pub fn boolean() -> Converter {
        from_fn(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got {raw:?}")),
        })
    }

    /// Accepts only one of `choices`, kept as a string.
    ///
    /// ```
    /// use gblibx_yaap::{convert, Value};
    ///
    /// let conv = convert::one_of(["json", "yaml"]);
    /// assert_eq!(conv("json"), Ok(Value::from("json")));
    /// assert_eq!(conv("xml").unwrap_err(), "expected one of json, yaml, got \"xml\"");
    /// ```
    pub fn one_of<I, S>(choices: I) -> Converter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        from_fn(move |raw| {
            if choices.iter().any(|c| c == raw) {
                Ok(Value::Str(raw.to_string()))
            } else {
                Err(format!(
                    "expected one of {}, got {raw:?}",
                    choices.join(", ")
                ))
            }
        })
    }
}
