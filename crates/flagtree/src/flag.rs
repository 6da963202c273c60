use std::fmt;

use crate::error::ValueError;
use crate::value::Value;

/// Placeholder shown for a flag's argument when no meta variable is given.
pub const DEFAULT_META_VAR: &str = "VALUE";

/// Produces completion candidates from the current argument window.
pub type Completer = Box<dyn Fn(&[String]) -> Vec<String>>;

/// One named option bound to its own [`Value`].
///
/// Built with the chained setters and handed to
/// [`FlagSet::register`](crate::FlagSet::register):
///
/// ```
/// use flagtree::{Flag, FlagSet, Value};
///
/// let mut set = FlagSet::new("app");
/// set.register(
///     Flag::new(Value::String(String::new()))
///         .short('o')
///         .long("output=FILE")
///         .help("Where to write"),
/// )
/// .unwrap();
/// assert_eq!(set.flag("--output").unwrap().meta_var(), "FILE");
/// ```
pub struct Flag {
    short: Option<char>,
    long: Option<String>,
    meta_var: String,
    help: String,
    value: Value,
    default_value: String,
    is_set: bool,
    completer: Option<Completer>,
}

impl Flag {
    pub fn new(value: Value) -> Self {
        Self {
            short: None,
            long: None,
            meta_var: String::new(),
            help: String::new(),
            value,
            default_value: String::new(),
            is_set: false,
            completer: None,
        }
    }

    /// Set the short name. Accepts `v`, `-v`, or `-o FILE` (with meta variable).
    pub fn short(mut self, name: impl Into<ShortName>) -> Self {
        let ShortName(raw) = name.into();
        let (short, meta) = normalize_short(&raw);
        self.short = short;
        if let Some(meta) = meta {
            self.meta_var = meta;
        }
        self
    }

    /// Set the long name. Accepts `output`, `--output`, or `--output=FILE`.
    pub fn long(mut self, name: impl AsRef<str>) -> Self {
        let (long, meta) = normalize_long(name.as_ref());
        self.long = long;
        if let Some(meta) = meta {
            self.meta_var = meta;
        }
        self
    }

    pub fn meta(mut self, meta_var: impl Into<String>) -> Self {
        self.meta_var = meta_var.into();
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Text applied through the Value when the flag is absent from the input.
    pub fn default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn completer(mut self, completer: impl Fn(&[String]) -> Vec<String> + 'static) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn meta_var(&self) -> &str {
        &self.meta_var
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn default_text(&self) -> &str {
        &self.default_value
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the flag was seen during the last parse pass.
    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub fn is_boolean(&self) -> bool {
        self.value.is_boolean()
    }

    pub fn has_completer(&self) -> bool {
        self.completer.is_some()
    }

    /// Sort key used for every user-visible listing: long name, else short name.
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }

    /// The flag as it would be typed: `--long`, else `-s`.
    pub fn token(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => String::new(),
        }
    }

    pub(crate) fn apply(&mut self, raw: &str) -> Result<(), ValueError> {
        self.is_set = true;
        self.value.set(raw)
    }

    /// Apply the default when the flag was not seen. Does not mark it set.
    pub(crate) fn apply_default(&mut self) -> Result<bool, ValueError> {
        if self.is_set || self.default_value.is_empty() {
            return Ok(false);
        }
        self.value.set(&self.default_value)?;
        Ok(true)
    }

    pub(crate) fn reset(&mut self) {
        self.is_set = false;
    }

    pub(crate) fn fill_meta_var(&mut self) {
        if self.meta_var.trim().is_empty() {
            self.meta_var = DEFAULT_META_VAR.to_string();
        }
    }

    pub(crate) fn complete(&self, args: &[String]) -> Option<Vec<String>> {
        self.completer.as_ref().map(|f| f(args))
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("meta_var", &self.meta_var)
            .field("value", &self.value)
            .field("default_value", &self.default_value)
            .field("is_set", &self.is_set)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if let Some(short) = self.short {
            names.push(format!("-{short}"));
        }
        if let Some(long) = &self.long {
            names.push(format!("--{long}"));
        }
        write!(f, "Flag[{}]", names.join(","))
    }
}

/// Raw short-name spelling; lets `short` take either a `char` or a string.
pub struct ShortName(String);

impl From<char> for ShortName {
    fn from(c: char) -> Self {
        Self(c.to_string())
    }
}

impl From<&str> for ShortName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ShortName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn normalize_short(raw: &str) -> (Option<char>, Option<String>) {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(c) => (Some(c), non_empty(chars.as_str())),
        None => (None, None),
    }
}

fn normalize_long(raw: &str) -> (Option<String>, Option<String>) {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("--").unwrap_or(trimmed);
    match trimmed.split_once(['=', ' ']) {
        Some((name, meta)) => (non_empty(name), non_empty(meta)),
        None => (non_empty(trimmed), None),
    }
}
