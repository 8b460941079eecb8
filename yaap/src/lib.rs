//! Yet another argument parser.
//!
//! Options are declared with aliases (`-o` or `-o|--output`), an optional
//! value name and a cardinality marker, then collected into groups that
//! double as usage sections:
//!
//! - [`Opt`]: schema and accumulated values of one option.
//! - [`Cardinality`]: `!` required once, `?` optional once, `*` any number,
//!   `+` at least once.
//! - [`Group`]: an ordered, described set of options.
//! - [`Parser`]: scans a command line against its groups and renders short
//!   and detailed usage.
//!
//! Parsing never exits the process. Help and a missing command line are
//! reported as [`ParseOutcome`]s, usage violations as [`ParseError`]s;
//! [`Parser::parse_or_exit`] is there for binaries that want the classic
//! behavior.
//!
//! Surfaces can also be described as data ([`Surface`]) and parse results
//! serialized ([`ParseReport`]).
//!
//! # Example
//!
//! ```
//! use gblibx_yaap::*;
//!
//! let mut parser = Parser::new("copy", "Options");
//! parser
//!     .add(Opt::new("-i|--input", "Input file")
//!         .with_arg("FILE")
//!         .with_cardinality(Cardinality::RequiredRepeated))
//!     .unwrap()
//!     .add(Opt::new("-j|--jobs", "Worker count")
//!         .with_arg("N")
//!         .with_default(1i64)
//!         .with_converter(convert::integer()))
//!     .unwrap();
//!
//! parser.parse(["-i", "a", "--input", "b", "-j", "4"]).unwrap();
//! assert_eq!(parser.option("input").unwrap().strings(), vec!["a", "b"]);
//! assert_eq!(parser.option("jobs").unwrap().as_int().unwrap(), Some(4));
//!
//! assert!(matches!(
//!     Parser::new("copy", "Options").parse(["--help"]),
//!     Ok(ParseOutcome::Help(_))
//! ));
//! ```

mod error;
mod group;
mod option;
mod parser;
mod surface;
mod value;

pub use error::{BadOption, ParseError, SchemaError};
pub use group::Group;
pub use option::{Cardinality, Opt};
pub use parser::{HELP_ALIASES, OPTION_PREFIX, ParseOutcome, Parser, USAGE_EXIT_CODE};
pub use surface::{ConvertDef, GroupDef, OptDef, ParseReport, PositionalDef, Surface};
pub use value::{Converter, Value, convert};
