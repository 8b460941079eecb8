//! Declarative CLI surfaces and serializable parse reports.
//!
//! A [`Surface`] describes a parser as data so it can be loaded from JSON or
//! YAML; [`Surface::build`] turns it into a ready [`Parser`]. After parsing,
//! [`ParseReport::from_parser`] captures the result for serialization.
//!
//! # Example YAML
//!
//! ```yaml
//! program: greet
//! groups:
//!   - description: Required
//!     options:
//!       - names: "-n|--name"
//!         arg: name
//!         repeat: "!"
//!         description: Who to greet
//!   - description: Optional
//!     options:
//!       - names: "-c|--count"
//!         arg: n
//!         default: 1
//!         convert: int
//! positional:
//!   usage: "file..."
//!   description: Input files
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, SchemaError};
use crate::group::Group;
use crate::option::{Cardinality, Opt};
use crate::parser::{ParseOutcome, Parser};
use crate::value::{Converter, Value, convert};

/// A whole parser described as data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    /// Program name shown in usage.
    pub program: String,
    /// Groups in registration order; the first one becomes the parser's
    /// default group.
    #[serde(default)]
    pub groups: Vec<GroupDef>,
    /// Positional argument usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positional: Option<PositionalDef>,
}

/// One option group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
    pub description: String,
    #[serde(default)]
    pub options: Vec<OptDef>,
}

/// One option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptDef {
    /// `-o` or `-o|--output`.
    pub names: String,
    /// Value name; absent for binary flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
    /// Cardinality marker, `?` when omitted.
    #[serde(default = "default_repeat")]
    pub repeat: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertDef>,
}

fn default_repeat() -> char {
    Cardinality::OptionalSingle.marker()
}

/// Named built-in converters.
///
/// Written as a bare name (`int`, `float`, `bool`) or as a one-key map
/// `{choice: [a, b]}`; the same text reads the same in JSON and YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConvertRepr", into = "ConvertRepr")]
pub enum ConvertDef {
    Int,
    Float,
    Bool,
    /// Only the listed strings are accepted.
    Choice(Vec<String>),
}

/// Wire form of [`ConvertDef`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConvertRepr {
    Name(String),
    Choice { choice: Vec<String> },
}

impl TryFrom<ConvertRepr> for ConvertDef {
    type Error = String;

    fn try_from(repr: ConvertRepr) -> Result<Self, Self::Error> {
        match repr {
            ConvertRepr::Name(name) => match name.as_str() {
                "int" => Ok(Self::Int),
                "float" => Ok(Self::Float),
                "bool" => Ok(Self::Bool),
                _ => Err(format!(
                    "unknown converter {name:?}, expected int, float, bool or {{choice: [..]}}"
                )),
            },
            ConvertRepr::Choice { choice } => Ok(Self::Choice(choice)),
        }
    }
}

impl From<ConvertDef> for ConvertRepr {
    fn from(def: ConvertDef) -> Self {
        match def {
            ConvertDef::Int => Self::Name("int".to_string()),
            ConvertDef::Float => Self::Name("float".to_string()),
            ConvertDef::Bool => Self::Name("bool".to_string()),
            ConvertDef::Choice(choice) => Self::Choice { choice },
        }
    }
}

impl ConvertDef {
    fn converter(&self) -> Converter {
        match self {
            Self::Int => convert::integer(),
            Self::Float => convert::float(),
            Self::Bool => convert::boolean(),
            Self::Choice(choices) => convert::one_of(choices.clone()),
        }
    }
}

/// Positional argument usage text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionalDef {
    pub usage: String,
    #[serde(default)]
    pub description: String,
}

impl OptDef {
    /// Builds the [`Opt`] described by this definition.
    pub fn to_opt(&self) -> Result<Opt, SchemaError> {
        let mut opt = Opt::new(&self.names, &self.description).repeat(self.repeat)?;
        if let Some(arg) = &self.arg {
            opt = opt.with_arg(arg);
        }
        if let Some(default) = &self.default {
            opt = opt.with_default(default.clone());
        }
        if let Some(conv) = &self.convert {
            opt = opt.with_converter(conv.converter());
        }
        Ok(opt)
    }
}

impl Surface {
    /// Builds a parser, registering every group and option in order.
    ///
    /// # Errors
    ///
    /// The first [`SchemaError`] raised while registering.
    ///
    /// # Examples
    ///
    /// ```
    /// use gblibx_yaap::Surface;
    ///
    /// let json = r#"{
    ///     "program": "greet",
    ///     "groups": [{
    ///         "description": "Options",
    ///         "options": [{"names": "-n|--name", "arg": "name", "repeat": "!"}]
    ///     }]
    /// }"#;
    /// let surface: Surface = serde_json::from_str(json).unwrap();
    /// let mut parser = surface.build().unwrap();
    /// parser.parse(["-n", "alice"]).unwrap();
    /// assert_eq!(parser.get_string("name").as_deref(), Some("alice"));
    /// ```
    pub fn build(&self) -> Result<Parser, SchemaError> {
        let mut groups = self.groups.iter();
        let first = groups.next();
        let mut parser = Parser::new(
            &self.program,
            first.map(|g| g.description.as_str()).unwrap_or("Options"),
        );
        if let Some(def) = first {
            for opt in &def.options {
                parser.add(opt.to_opt()?)?;
            }
        }
        for def in groups {
            let group = Group::with_options(
                &def.description,
                def.options
                    .iter()
                    .map(OptDef::to_opt)
                    .collect::<Result<Vec<_>, _>>()?,
            )?;
            parser.add_group(group);
        }
        if let Some(pos) = &self.positional {
            parser.positional_usage(&pos.usage, &pos.description);
        }
        Ok(parser)
    }

    /// Parses a surface from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Serializable result of one parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    /// `parsed`, `help`, `missing-arguments` or `error`.
    pub outcome: &'static str,
    /// Canonical option name → effective values.
    pub options: BTreeMap<String, Vec<Value>>,
    pub positional: Vec<String>,
    /// Usage text for help / missing-argument outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Error message for failed parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseReport {
    /// Captures the parser state after `result` was returned by it.
    pub fn from_parser(parser: &Parser, result: &Result<ParseOutcome, ParseError>) -> Self {
        let (outcome, usage, error) = match result {
            Ok(ParseOutcome::Parsed) => ("parsed", None, None),
            Ok(ParseOutcome::Help(text)) => ("help", Some(text.clone()), None),
            Ok(ParseOutcome::MissingArguments(text)) => {
                ("missing-arguments", Some(text.clone()), None)
            }
            Err(err) => ("error", None, Some(err.to_string())),
        };
        let options = parser
            .did_options()
            .into_iter()
            .filter_map(|name| {
                parser
                    .option(name)
                    .map(|opt| (name.to_string(), opt.effective_values()))
            })
            .collect();
        Self {
            outcome,
            options,
            positional: parser.positional_args().to_vec(),
            usage,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == "parsed"
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
