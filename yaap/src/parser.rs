//! Command-line parsing against registered option groups.
//!
//! [`Parser::parse`] scans tokens left to right:
//!
//! 1. while tokens start with `-` they are options; `-h`/`--help` stops with
//!    [`ParseOutcome::Help`], everything else must match an alias in one of
//!    the groups (searched in registration order) and consumes its value when
//!    it takes one;
//! 2. the first token without `-` starts positional collection, and no option
//!    may follow;
//! 3. every required option of every group must then have a value.
//!
//! Nothing here terminates the process; [`Parser::parse_or_exit`] opts into
//! the classic print-usage-and-exit behavior.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ParseError, SchemaError};
use crate::group::Group;
use crate::option::Opt;

/// Aliases that always request detailed usage.
pub const HELP_ALIASES: &[&str] = &["-h", "--help"];

/// Tokens starting with this character are options.
pub const OPTION_PREFIX: char = '-';

/// Exit status used by [`Parser::parse_or_exit`].
pub const USAGE_EXIT_CODE: i32 = 1;

/// Non-error result of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// All tokens consumed and every required option satisfied.
    Parsed,
    /// `-h`/`--help` was given; carries the detailed usage text.
    Help(String),
    /// At least one argument was required but none was given; carries the
    /// short usage text.
    MissingArguments(String),
}

/// Option parser over one or more [`Group`]s.
///
/// The first group is created with the parser and receives options added via
/// [`Parser::add`].
///
/// # Examples
///
/// ```
/// use gblibx_yaap::{Cardinality, Opt, ParseOutcome, Parser};
///
/// let mut parser = Parser::new("greet", "Options");
/// parser
///     .add(Opt::new("-n|--name", "Who to greet")
///         .with_arg("name")
///         .with_cardinality(Cardinality::RequiredSingle))
///     .unwrap();
/// parser.add_flag("-l|--loud", "Shout").unwrap();
///
/// let outcome = parser.parse(["--name", "alice", "file.txt"]).unwrap();
/// assert_eq!(outcome, ParseOutcome::Parsed);
/// assert_eq!(parser.get_string("name").as_deref(), Some("alice"));
/// assert!(!parser.option("loud").unwrap().is_true());
/// assert_eq!(parser.positional_args(), ["file.txt"]);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    prog_name: String,
    groups: Vec<Group>,
    /// Canonical name → index of the group owning the tracked option.
    did_opts: HashMap<String, usize>,
    pos_args: Vec<String>,
    pos_arg_usage: Option<(String, String)>,
    parsed: bool,
}

impl Parser {
    /// Creates a parser whose default group is headed by `description`.
    pub fn new(prog_name: &str, description: &str) -> Self {
        Self {
            prog_name: prog_name.to_string(),
            groups: vec![Group::new(description)],
            did_opts: HashMap::new(),
            pos_args: Vec::new(),
            pos_arg_usage: None,
            parsed: false,
        }
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    /// Registers an option in the default group.
    pub fn add(&mut self, opt: Opt) -> Result<&mut Group, SchemaError> {
        self.default_group_mut().add(opt)
    }

    /// Registers an optional binary flag in the default group.
    pub fn add_flag(
        &mut self,
        names: &str,
        description: &str,
    ) -> Result<&mut Group, SchemaError> {
        self.default_group_mut().add_flag(names, description)
    }

    /// Registers an optional option with an argument in the default group.
    pub fn add_with_arg(
        &mut self,
        names: &str,
        value_name: &str,
        description: &str,
    ) -> Result<&mut Group, SchemaError> {
        self.default_group_mut()
            .add_with_arg(names, value_name, description)
    }

    /// Appends a group and returns it for further registration.
    pub fn add_group(&mut self, group: Group) -> &mut Group {
        self.groups.push(group);
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    pub fn group(&self, ix: usize) -> Option<&Group> {
        self.groups.get(ix)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn default_group_mut(&mut self) -> &mut Group {
        &mut self.groups[0]
    }

    /// Usage text for positional arguments, e.g. `("file...", "Input files")`.
    pub fn positional_usage(&mut self, arg: &str, description: &str) -> &mut Self {
        self.pos_arg_usage = Some((arg.to_string(), description.to_string()));
        self
    }

    /// Parses `argv`, requiring at least one argument.
    pub fn parse<I, S>(&mut self, argv: I) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_args(argv, true)
    }

    /// Parses `argv`.
    ///
    /// With `need_at_least_one` and an empty `argv` nothing is parsed and
    /// [`ParseOutcome::MissingArguments`] is returned.
    ///
    /// # Errors
    ///
    /// The first usage violation found. Values recorded before the violation
    /// stay in their options.
    pub fn parse_args<I, S>(
        &mut self,
        argv: I,
        need_at_least_one: bool,
    ) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.parsed {
            return Err(ParseError::AlreadyParsed);
        }
        let args: Vec<String> = argv.into_iter().map(Into::into).collect();
        if need_at_least_one && args.is_empty() {
            return Ok(ParseOutcome::MissingArguments(self.short_usage()));
        }
        self.parsed = true;
        debug!(prog = %self.prog_name, argc = args.len(), "parsing arguments");

        let mut tokens = args.into_iter().peekable();
        while let Some(arg) = tokens.next_if(|t| t.starts_with(OPTION_PREFIX)) {
            if HELP_ALIASES.contains(&arg.as_str()) {
                return Ok(ParseOutcome::Help(self.detailed_usage()));
            }
            let (group_ix, key) = self.track(&arg)?;
            let opt = self.groups[group_ix]
                .get_mut(&key)
                .ok_or_else(|| ParseError::InvalidOption(arg.clone()))?;
            if opt.takes_arg() {
                let value = tokens
                    .next()
                    .ok_or_else(|| ParseError::MissingValue(arg.clone()))?;
                opt.add_value(&value)?;
            } else {
                opt.set_binary()?;
            }
        }

        for arg in tokens {
            if arg.starts_with(OPTION_PREFIX) {
                return Err(ParseError::InvalidOption(arg));
            }
            self.pos_args.push(arg);
        }

        self.check_all_required()?;
        debug!(
            options = self.did_opts.len(),
            positional = self.pos_args.len(),
            "arguments parsed"
        );
        Ok(ParseOutcome::Parsed)
    }

    /// Parses `argv`, handing any [`ParseError`] to `handler`.
    ///
    /// Returns `None` when the handler was invoked.
    pub fn parse_with_handler<I, S, F>(
        &mut self,
        argv: I,
        need_at_least_one: bool,
        handler: F,
    ) -> Option<ParseOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(ParseError),
    {
        match self.parse_args(argv, need_at_least_one) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                handler(err);
                None
            }
        }
    }

    /// Parses `argv` and terminates the process on anything but success.
    ///
    /// Help prints detailed usage, a missing argument prints short usage and
    /// a usage violation prints the error; all go to stderr and exit with
    /// [`USAGE_EXIT_CODE`].
    pub fn parse_or_exit<I, S>(&mut self, argv: I, need_at_least_one: bool) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.parse_args(argv, need_at_least_one) {
            Ok(ParseOutcome::Parsed) => self,
            Ok(ParseOutcome::Help(usage)) | Ok(ParseOutcome::MissingArguments(usage)) => {
                eprintln!("{usage}");
                std::process::exit(USAGE_EXIT_CODE);
            }
            Err(err) => {
                eprintln!("{}: {err}", self.prog_name);
                std::process::exit(USAGE_EXIT_CODE);
            }
        }
    }

    /// Resolves a raw token to the tracked option, recording it on first
    /// occurrence.
    fn track(&mut self, token: &str) -> Result<(usize, String), ParseError> {
        let (group_ix, key) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(ix, g)| g.find(token).map(|opt| (ix, opt.canonical_name().to_string())))
            .ok_or_else(|| ParseError::InvalidOption(token.to_string()))?;
        let group_ix = *self.did_opts.entry(key.clone()).or_insert(group_ix);
        Ok((group_ix, key))
    }

    fn check_all_required(&mut self) -> Result<(), ParseError> {
        for (ix, group) in self.groups.iter().enumerate() {
            for opt in group.options() {
                if !opt.is_required_met() {
                    return Err(ParseError::RequiredOption(opt.display_name()));
                }
                self.did_opts
                    .entry(opt.canonical_name().to_string())
                    .or_insert(ix);
            }
        }
        Ok(())
    }

    /// Whether `name` (canonical) is tracked.
    pub fn has_key(&self, name: &str) -> bool {
        self.did_opts.contains_key(name)
    }

    /// The tracked option for canonical `name`.
    ///
    /// After a successful parse every registered option is tracked.
    pub fn option(&self, name: &str) -> Option<&Opt> {
        let ix = *self.did_opts.get(name)?;
        self.groups.get(ix)?.get(name)
    }

    /// Applies `f` to the option when it was actually given values.
    pub fn if_has_option<T>(&self, name: &str, f: impl FnOnce(&Opt) -> T) -> Option<T> {
        self.option(name).filter(|opt| opt.has_values()).map(f)
    }

    /// First effective value of `name` as a string.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.option(name)?.strings().into_iter().next()
    }

    /// Canonical names of all tracked options, sorted.
    pub fn did_options(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.did_opts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn positional_args(&self) -> &[String] {
        &self.pos_args
    }

    pub fn has_positional_args(&self) -> bool {
        !self.pos_args.is_empty()
    }

    /// `Usage: <prog> [-h|--help] <groups...> [<positional>]`
    pub fn short_usage(&self) -> String {
        let mut buf = format!("Usage: {} [-h|--help]", self.prog_name);
        for group in &self.groups {
            if !group.is_empty() {
                buf.push(' ');
                buf.push_str(&group.to_string());
            }
        }
        if let Some((arg, _)) = &self.pos_arg_usage {
            buf.push(' ');
            buf.push_str(arg);
        }
        buf.push('\n');
        buf
    }

    /// Short usage followed by every group's detailed section.
    pub fn detailed_usage(&self) -> String {
        let mut buf = self.short_usage();
        for group in &self.groups {
            buf.push('\n');
            buf.push_str(&group.detailed_usage());
        }
        if let Some((arg, description)) = &self.pos_arg_usage {
            buf.push('\n');
            buf.push_str(arg);
            buf.push_str("    ");
            buf.push_str(description);
            buf.push('\n');
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cardinality, Value, convert};

    fn schema() -> Parser {
        let mut parser = Parser::new("prog", "Required");
        parser
            .add(
                Opt::new("-n|--name", "Name")
                    .with_arg("name")
                    .with_cardinality(Cardinality::RequiredSingle),
            )
            .unwrap();
        let optional = parser.add_group(Group::new("Optional"));
        optional
            .add(
                Opt::new("-t|--tag", "Tag")
                    .with_arg("tag")
                    .with_cardinality(Cardinality::OptionalRepeated),
            )
            .unwrap()
            .add_flag("-v|--verbose", "Verbose")
            .unwrap();
        parser
    }

    #[test]
    fn test_parse_options_and_positionals() {
        let mut parser = schema();
        let outcome = parser
            .parse(["--name", "alice", "-t", "x", "-t", "y", "file1", "file2"])
            .unwrap();
        assert_eq!(outcome, ParseOutcome::Parsed);
        assert_eq!(parser.get_string("name").as_deref(), Some("alice"));
        assert_eq!(parser.option("tag").unwrap().strings(), vec!["x", "y"]);
        assert_eq!(parser.positional_args(), ["file1", "file2"]);
        assert!(parser.has_positional_args());
    }

    #[test]
    fn test_missing_required_option_is_reported() {
        let mut parser = schema();
        let err = parser.parse(["-t", "x"]).unwrap_err();
        assert_eq!(err, ParseError::RequiredOption("-n|--name".to_string()));
        assert!(!parser.has_positional_args());
    }

    #[test]
    fn test_required_option_not_satisfied_by_positionals() {
        let mut parser = schema();
        let err = parser.parse(["alice", "bob"]).unwrap_err();
        assert_eq!(err, ParseError::RequiredOption("-n|--name".to_string()));
        assert_eq!(parser.positional_args(), ["alice", "bob"]);
        assert!(!parser.option("name").is_some_and(Opt::has_values));
    }

    #[test]
    fn test_help_returns_detailed_usage() {
        let mut parser = schema();
        let outcome = parser.parse(["-h"]).unwrap();
        let ParseOutcome::Help(text) = outcome else {
            panic!("expected Help, got {outcome:?}");
        };
        assert!(text.starts_with("Usage: prog [-h|--help] -n|--name name"));
        assert!(text.contains("Optional\n--------\n"));
        assert!(text.contains("-t|--tag tag"));
    }

    #[test]
    fn test_help_wins_even_after_other_options() {
        let mut parser = schema();
        let outcome = parser.parse(["-v", "--help"]).unwrap();
        assert!(matches!(outcome, ParseOutcome::Help(_)));
    }

    #[test]
    fn test_empty_argv_needs_one_argument() {
        let mut parser = schema();
        let outcome = parser.parse(Vec::<String>::new()).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::MissingArguments(parser.short_usage())
        );

        // Without the minimum the required option is what fails.
        let err = parser.parse_args(Vec::<String>::new(), false).unwrap_err();
        assert!(matches!(err, ParseError::RequiredOption(_)));
    }

    #[test]
    fn test_single_option_twice_is_bad_option() {
        let mut parser = schema();
        let err = parser
            .parse(["-n", "alice", "--name", "bob"])
            .unwrap_err();
        assert_eq!(err.option(), Some("-n|--name"));
        assert!(matches!(err, ParseError::BadOption(_)));
        assert_eq!(err.to_string(), "-n|--name: < 1 occurrence at: bob");
    }

    #[test]
    fn test_binary_flag_twice_is_bad_option() {
        let mut parser = schema();
        let err = parser.parse(["-n", "a", "-v", "--verbose"]).unwrap_err();
        assert_eq!(err.to_string(), "-v|--verbose: option already specified");
    }

    #[test]
    fn test_aliases_accumulate_into_one_option() {
        let mut parser = schema();
        parser
            .parse(["-n", "a", "-t", "x", "--tag", "y", "-t", "z"])
            .unwrap();
        let tag = parser.option("tag").unwrap();
        assert_eq!(
            tag.values(),
            &[Value::from("x"), Value::from("y"), Value::from("z")]
        );
    }

    #[test]
    fn test_unknown_option_is_invalid() {
        let mut parser = schema();
        let err = parser.parse(["-n", "a", "--bogus"]).unwrap_err();
        assert_eq!(err, ParseError::InvalidOption("--bogus".to_string()));
    }

    #[test]
    fn test_option_after_positional_is_invalid() {
        let mut parser = schema();
        let err = parser.parse(["-n", "a", "file", "-v"]).unwrap_err();
        assert_eq!(err, ParseError::InvalidOption("-v".to_string()));
        assert_eq!(parser.positional_args(), ["file"]);
    }

    #[test]
    fn test_missing_value_at_end() {
        let mut parser = schema();
        let err = parser.parse(["-t"]).unwrap_err();
        assert_eq!(err, ParseError::MissingValue("-t".to_string()));
    }

    #[test]
    fn test_value_token_may_start_with_dash() {
        let mut parser = schema();
        parser.parse(["-n", "-alice-"]).unwrap();
        assert_eq!(parser.get_string("name").as_deref(), Some("-alice-"));
    }

    #[test]
    fn test_unspecified_options_visible_after_parse() {
        let mut parser = Parser::new("prog", "Options");
        parser
            .add(
                Opt::new("-o|--out", "")
                    .with_arg("file")
                    .with_default("a.out"),
            )
            .unwrap();
        parser.add_flag("-q", "").unwrap();
        parser.parse(["x"]).unwrap();

        assert_eq!(parser.did_options(), vec!["out", "q"]);
        assert_eq!(parser.get_string("out").as_deref(), Some("a.out"));
        assert!(!parser.option("q").unwrap().is_true());
        assert_eq!(parser.if_has_option("out", |o| o.strings()), None);
    }

    #[test]
    fn test_converter_failure_surfaces_through_parse() {
        let mut parser = Parser::new("prog", "Options");
        parser
            .add(
                Opt::new("-j|--jobs", "")
                    .with_arg("n")
                    .with_converter(convert::integer()),
            )
            .unwrap();
        let err = parser.parse(["-j", "lots"]).unwrap_err();
        let ParseError::BadOption(bad) = err else {
            panic!("expected BadOption");
        };
        assert_eq!(bad.option, "-j|--jobs");
        assert!(bad.message.starts_with("invalid argument:"));
    }

    #[test]
    fn test_second_parse_is_rejected() {
        let mut parser = schema();
        parser.parse(["-n", "a"]).unwrap();
        assert_eq!(parser.parse(["-n", "b"]), Err(ParseError::AlreadyParsed));
    }

    #[test]
    fn test_first_group_wins_for_shared_alias() {
        let mut parser = Parser::new("prog", "A");
        parser.add_with_arg("-x|--extra", "v", "").unwrap();
        parser
            .add_group(Group::new("B"))
            .add_with_arg("-x|--extra", "v", "")
            .unwrap();
        parser.parse(["-x", "1"]).unwrap();
        assert_eq!(parser.group(0).unwrap().get("extra").unwrap().strings(), vec!["1"]);
        assert!(!parser.group(1).unwrap().get("extra").unwrap().has_values());
    }

    #[test]
    fn test_parse_with_handler_routes_errors() {
        let mut parser = schema();
        let mut seen = None;
        let outcome = parser.parse_with_handler(["--nope"], true, |e| seen = Some(e));
        assert!(outcome.is_none());
        assert_eq!(seen, Some(ParseError::InvalidOption("--nope".to_string())));
    }

    #[test]
    fn test_short_and_detailed_usage_with_positionals() {
        let mut parser = schema();
        parser.positional_usage("file...", "Input files");
        assert_eq!(
            parser.short_usage(),
            "Usage: prog [-h|--help] -n|--name name [-t|--tag tag]... [-v|--verbose] file...\n"
        );
        assert!(parser.detailed_usage().ends_with("\nfile...    Input files\n"));
    }

    #[test]
    fn test_duplicate_registration_is_schema_error() {
        let mut parser = Parser::new("prog", "Options");
        parser.add_flag("-v|--verbose", "").unwrap();
        assert_eq!(
            parser.add_flag("-v|--verbose", "").unwrap_err(),
            SchemaError::DuplicateOption("verbose".to_string())
        );
    }
}
