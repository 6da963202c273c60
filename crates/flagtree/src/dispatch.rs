//! Subcommands: child flag sets selected by the first positional argument.

use crate::error::{FlagError, Result};
use crate::flagset::FlagSet;

impl FlagSet {
    /// Register `command` as a subcommand under its own name.
    ///
    /// A command registered earlier under the same name is replaced.
    pub fn add_command(&mut self, command: FlagSet) -> &mut Self {
        if self.commands.contains_key(&command.name) {
            tracing::warn!(set = %self.name, command = %command.name, "replacing subcommand");
        }
        self.commands.insert(command.name.clone(), command);
        self
    }

    pub fn command(&self, name: &str) -> Option<&FlagSet> {
        self.commands.get(name)
    }

    /// Subcommand names in sorted order.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Name of the subcommand selected by the last parse, if any.
    pub fn command_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_command(&self) -> Option<&FlagSet> {
        self.active.as_deref().and_then(|name| self.commands.get(name))
    }

    /// This set followed by each selected subcommand, outermost first.
    pub fn active_path(&self) -> Vec<&FlagSet> {
        let mut path = vec![self];
        let mut current = self;
        while let Some(child) = current.active_command() {
            path.push(child);
            current = child;
        }
        path
    }

    /// Hand the positional remainder to the subcommand it names.
    pub(crate) fn dispatch(&mut self) -> Result<()> {
        if self.commands.is_empty() || self.args.is_empty() {
            return Ok(());
        }

        let name = self.args[0].clone();
        let rest = self.args[1..].to_vec();
        let Some(child) = self.commands.get_mut(&name) else {
            return Err(FlagError::UnknownCommand {
                set: self.name.clone(),
                command: name,
            });
        };

        tracing::debug!(set = %self.name, command = %name, "selected subcommand");
        self.active = Some(name);
        child.parse(&rest)
    }
}
