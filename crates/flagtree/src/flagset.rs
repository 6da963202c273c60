use std::collections::HashMap;
use std::fmt;

use crate::bind::FlagField;
use crate::error::{FlagError, Result};
use crate::flag::{Completer, Flag};

/// Long name reserved for the built-in help request.
pub const HELP_LONG: &str = "help";
/// Short name reserved for the built-in help request.
pub const HELP_SHORT: char = 'h';

/// A named registry of flags, the parser over them, and its subcommands.
///
/// Flags live in registration order; the short and long tables index into
/// that list, so a flag with both names is reachable from either.
pub struct FlagSet {
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) flags: Vec<Flag>,
    pub(crate) short: HashMap<char, usize>,
    pub(crate) long: HashMap<String, usize>,
    pub(crate) args: Vec<String>,
    pub(crate) commands: HashMap<String, FlagSet>,
    pub(crate) active: Option<String>,
    pub(crate) completer: Option<Completer>,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            flags: Vec::new(),
            short: HashMap::new(),
            long: HashMap::new(),
            args: Vec::new(),
            commands: HashMap::new(),
            active: None,
            completer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form usage text printed under the help header.
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Completion callback for positional arguments of this set.
    pub fn with_completer(
        mut self,
        completer: impl Fn(&[String]) -> Vec<String> + 'static,
    ) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Register a flag.
    ///
    /// Fails with [`FlagError::UnnamedFlag`] when both names are empty and
    /// with [`FlagError::RedefinedFlag`] when a name is taken or reserved
    /// (`-h`, `--help`). A failed registration leaves the set unchanged.
    pub fn register(&mut self, mut flag: Flag) -> Result<&mut Self> {
        let short = flag.short_name();
        let long = flag.long_name().map(str::to_string);

        if short.is_none() && long.is_none() {
            return Err(FlagError::UnnamedFlag {
                set: self.name.clone(),
            });
        }
        if let Some(c) = short {
            if c == HELP_SHORT || self.short.contains_key(&c) {
                return Err(self.redefined(format!("-{c}")));
            }
        }
        if let Some(name) = &long {
            if name == HELP_LONG || self.long.contains_key(name) {
                return Err(self.redefined(format!("--{name}")));
            }
        }

        flag.fill_meta_var();
        let idx = self.flags.len();
        if let Some(c) = short {
            self.short.insert(c, idx);
        }
        if let Some(name) = long {
            self.long.insert(name, idx);
        }
        tracing::trace!(set = %self.name, flag = %flag, "registered flag");
        self.flags.push(flag);
        Ok(self)
    }

    fn redefined(&self, name: String) -> FlagError {
        FlagError::RedefinedFlag {
            set: self.name.clone(),
            name,
        }
    }

    /// Look up a flag by `--long`, `-s`, or a bare name.
    ///
    /// A prefixed name only searches its own table; a bare name tries the
    /// long table first, then the short one.
    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flag_index(name).map(|idx| &self.flags[idx])
    }

    pub(crate) fn flag_index(&self, name: &str) -> Option<usize> {
        if let Some(long) = name.strip_prefix("--") {
            return self.long.get(long).copied();
        }
        if let Some(short) = name.strip_prefix('-') {
            return self.short_index(short);
        }
        self.long
            .get(name)
            .copied()
            .or_else(|| self.short_index(name))
    }

    fn short_index(&self, name: &str) -> Option<usize> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.short.get(&c).copied(),
            _ => None,
        }
    }

    /// Read a flag's current value as `T`.
    pub fn value_of<T: FlagField>(&self, name: &str) -> Option<T> {
        self.flag(name).and_then(|f| T::from_value(f.value()))
    }

    /// Whether the named flag was seen during the last parse.
    pub fn is_set(&self, name: &str) -> bool {
        self.flag(name).is_some_and(Flag::is_set)
    }

    /// Flags in registration order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Flags ordered by display name, for help and completion output.
    pub fn sorted_flags(&self) -> Vec<&Flag> {
        let mut flags: Vec<&Flag> = self.flags.iter().collect();
        flags.sort_by_key(|f| f.display_name());
        flags
    }

    /// Call `f` for every flag, stopping at the first error.
    pub fn visit<E>(
        &self,
        mut f: impl FnMut(&Flag) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        self.flags.iter().try_for_each(|flag| f(flag))
    }

    /// Positional arguments left over by the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("commands", &self.commands)
            .field("active", &self.active)
            .finish()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagSet[{}]", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn bool_flag() -> Flag {
        Flag::new(Value::Bool(false))
    }

    #[test]
    fn rejects_unnamed_flag() {
        let mut set = FlagSet::new("app");
        let err = set.register(bool_flag()).unwrap_err();
        assert!(matches!(err, FlagError::UnnamedFlag { ref set } if set == "app"));
        assert_eq!(set.flags().count(), 0);
    }

    #[test]
    fn rejects_duplicate_long_name() {
        let mut set = FlagSet::new("app");
        set.register(Flag::new(Value::uint(16)).long("port")).unwrap();
        let err = set
            .register(Flag::new(Value::uint(16)).short('p').long("port"))
            .unwrap_err();
        match err {
            FlagError::RedefinedFlag { name, .. } => assert_eq!(name, "--port"),
            other => panic!("expected RedefinedFlag, got: {other:?}"),
        }
        // The short name of the rejected flag must not leak into the table.
        assert!(set.flag("-p").is_none());
    }

    #[test]
    fn rejects_duplicate_short_name() {
        let mut set = FlagSet::new("app");
        set.register(bool_flag().short('v')).unwrap();
        let err = set.register(bool_flag().short('v').long("verbose")).unwrap_err();
        assert!(matches!(err, FlagError::RedefinedFlag { ref name, .. } if name == "-v"));
        assert!(set.flag("verbose").is_none());
    }

    #[test]
    fn help_names_are_reserved() {
        let mut set = FlagSet::new("app");
        assert!(set.register(bool_flag().long("help")).is_err());
        assert!(set.register(bool_flag().short('h')).is_err());
    }

    #[test]
    fn short_and_long_namespaces_are_independent() {
        let mut set = FlagSet::new("app");
        set.register(bool_flag().short('v')).unwrap();
        set.register(bool_flag().long("v")).unwrap();
        assert_eq!(set.flags().count(), 2);
    }

    #[test]
    fn lookup_accepts_any_spelling() {
        let mut set = FlagSet::new("app");
        set.register(bool_flag().short('v').long("verbose")).unwrap();
        for name in ["v", "-v", "verbose", "--verbose"] {
            assert!(set.flag(name).is_some(), "{name}");
        }
        assert!(set.flag("-x").is_none());
        assert!(set.flag("verb").is_none());
    }

    #[test]
    fn prefixes_select_the_name_table() {
        let mut set = FlagSet::new("app");
        set.register(Flag::new(Value::String(String::new())).short('o'))
            .unwrap()
            .register(bool_flag().long("o"))
            .unwrap();

        assert!(!set.flag("-o").unwrap().is_boolean());
        assert!(set.flag("--o").unwrap().is_boolean());
        // A bare name prefers the long table.
        assert!(set.flag("o").unwrap().is_boolean());

        let mut set = FlagSet::new("app");
        set.register(bool_flag().long("x")).unwrap();
        assert!(set.flag("-x").is_none());
        assert!(set.flag("--v").is_none());
        assert!(set.flag("-xy").is_none());
    }

    #[test]
    fn visit_stops_at_first_error() {
        let mut set = FlagSet::new("app");
        set.register(bool_flag().long("a"))
            .unwrap()
            .register(bool_flag().long("b"))
            .unwrap()
            .register(bool_flag().long("c"))
            .unwrap();

        let mut seen = Vec::new();
        let res = set.visit(|flag| {
            seen.push(flag.display_name());
            if flag.long_name() == Some("b") { Err("stop") } else { Ok(()) }
        });
        assert_eq!(res, Err("stop"));
        assert_eq!(seen, ["a", "b"]);
        assert_eq!(set.visit(|_| Ok::<(), ()>(())), Ok(()));
    }

    #[test]
    fn usage_text_is_kept() {
        let set = FlagSet::new("app").with_usage("app [OPTIONS]");
        assert_eq!(set.usage(), "app [OPTIONS]");
        assert_eq!(FlagSet::new("bare").usage(), "");
    }

    #[test]
    fn default_meta_var_is_filled() {
        let mut set = FlagSet::new("app");
        set.register(Flag::new(Value::String(String::new())).long("name")).unwrap();
        assert_eq!(set.flag("name").unwrap().meta_var(), "VALUE");
    }

    #[test]
    fn sorted_flags_use_display_name() {
        let mut set = FlagSet::new("app");
        set.register(bool_flag().long("zeta")).unwrap();
        set.register(bool_flag().short('b')).unwrap();
        set.register(bool_flag().short('y').long("alpha")).unwrap();
        let names: Vec<String> = set.sorted_flags().iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["alpha", "b", "zeta"]);
    }
}
