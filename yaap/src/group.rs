//! Named, ordered collections of options.

use std::fmt;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::option::Opt;

/// Columns between the widest option and its description in detailed usage.
const DETAIL_MARGIN: usize = 4;

/// A usage section: a description plus options keyed by canonical name, in
/// insertion order.
///
/// # Examples
///
/// ```
/// use gblibx_yaap::{Group, Opt};
///
/// let mut group = Group::new("Options");
/// group.add_flag("-v|--verbose", "Chatty output").unwrap();
/// group.add_with_arg("-o|--out", "FILE", "Output file").unwrap();
///
/// assert!(group.contains("verbose"));
/// assert_eq!(group.find("-o").unwrap().canonical_name(), "out");
/// assert_eq!(group.to_string(), "[-v|--verbose] [-o|--out FILE]");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Group {
    description: String,
    options: IndexMap<String, Opt>,
}

impl Group {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            options: IndexMap::new(),
        }
    }

    /// Creates a group and registers `options` in order.
    pub fn with_options<I>(description: &str, options: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Opt>,
    {
        let mut group = Self::new(description);
        for opt in options {
            group.add(opt)?;
        }
        Ok(group)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Registers an option.
    ///
    /// # Errors
    ///
    /// [`SchemaError::DuplicateOption`] when the canonical name is taken,
    /// [`SchemaError::DuplicateAlias`] when another option already answers to
    /// one of its aliases, or whatever [`Opt::check`] reports.
    pub fn add(&mut self, opt: Opt) -> Result<&mut Self, SchemaError> {
        opt.check()?;
        let key = opt.canonical_name().to_string();
        if self.options.contains_key(&key) {
            return Err(SchemaError::DuplicateOption(key));
        }
        if let Some(alias) = opt.aliases().iter().find(|a| self.find(a).is_some()) {
            return Err(SchemaError::DuplicateAlias(alias.clone()));
        }
        self.options.insert(key, opt);
        Ok(self)
    }

    /// Registers an optional binary flag.
    pub fn add_flag(&mut self, names: &str, description: &str) -> Result<&mut Self, SchemaError> {
        self.add(Opt::new(names, description))
    }

    /// Registers an optional (`?`) option taking one argument.
    pub fn add_with_arg(
        &mut self,
        names: &str,
        value_name: &str,
        description: &str,
    ) -> Result<&mut Self, SchemaError> {
        self.add(Opt::new(names, description).with_arg(value_name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Looks up an option by canonical name.
    pub fn get(&self, name: &str) -> Option<&Opt> {
        self.options.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Opt> {
        self.options.get_mut(name)
    }

    /// Options in registration order.
    pub fn options(&self) -> impl Iterator<Item = &Opt> {
        self.options.values()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Finds the option owning the raw alias `token` (e.g. `-o`).
    pub fn find(&self, token: &str) -> Option<&Opt> {
        self.options.values().find(|opt| opt.matches(token))
    }

    /// Header, underline and one column-aligned line per option.
    pub fn detailed_usage(&self) -> String {
        let width = self
            .options
            .values()
            .map(|opt| opt.detailed_args().len())
            .max()
            .unwrap_or(0);
        let justify = width + DETAIL_MARGIN;

        let mut out = String::new();
        out.push_str(&self.description);
        out.push('\n');
        out.push_str(&"-".repeat(self.description.chars().count()));
        out.push('\n');
        for opt in self.options.values() {
            out.push_str("  ");
            out.push_str(&opt.detailed_usage(justify));
            out.push('\n');
        }
        out
    }
}

/// Short usage: every option's syntax separated by a space.
impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for opt in self.options.values() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{opt}")?;
            first = false;
        }
        Ok(())
    }
}
