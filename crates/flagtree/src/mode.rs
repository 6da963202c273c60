//! Execution mode selection and the single `run` entry point.
//!
//! A program built on flagtree is also its own completion backend: the
//! shell re-invokes it with [`COMPLETION_ENV`] set, and instead of doing
//! its normal work it prints candidates for the words typed so far.

use std::collections::HashMap;

use crate::completion::bash_script;
use crate::error::Result;
use crate::flagset::FlagSet;

/// Set to `1` to print completion candidates instead of running.
pub const COMPLETION_ENV: &str = "FLAGTREE_COMPLETION";

/// Set to `1` to print the bash integration script instead of running.
pub const COMPLETION_SCRIPT_ENV: &str = "FLAGTREE_COMPLETION_SCRIPT";

/// Abstraction over environment variables.
pub trait EnvReader {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvReader for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    EmitCompletions,
    EmitScript,
}

impl Mode {
    /// Pick the mode from the environment. Completion wins over the script.
    pub fn detect(env: &impl EnvReader) -> Self {
        let enabled = |name: &str| env.var(name).is_some_and(|v| v.trim() == "1");
        if enabled(COMPLETION_ENV) {
            Self::EmitCompletions
        } else if enabled(COMPLETION_SCRIPT_ENV) {
            Self::EmitScript
        } else {
            Self::Normal
        }
    }
}

/// What a [`FlagSet::run`] call produced. Exiting is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Arguments were parsed into the registry.
    Parsed,
    /// `-h`/`--help` was seen; carries the usage text of the set that saw it.
    Help(String),
    Completions(Vec<String>),
    Script(String),
}

impl FlagSet {
    /// Parse, complete or emit the integration script, depending on `mode`.
    ///
    /// `program` is the invocation path (`argv[0]`); `args` excludes it.
    pub fn run<S: AsRef<str>>(&mut self, mode: Mode, program: &str, args: &[S]) -> Result<Outcome> {
        tracing::debug!(set = %self.name, ?mode, "running");
        match mode {
            Mode::EmitScript => Ok(Outcome::Script(bash_script(program))),
            Mode::EmitCompletions => Ok(Outcome::Completions(self.complete(args))),
            Mode::Normal => match self.parse(args) {
                Ok(()) => Ok(Outcome::Parsed),
                Err(err) if err.is_help() => Ok(Outcome::Help(self.help_for(program))),
                Err(err) => Err(err),
            },
        }
    }

    /// Help of the deepest selected subcommand, labelled with the command path.
    fn help_for(&self, program: &str) -> String {
        let path = self.active_path();
        let mut label = program.to_string();
        for set in &path[1..] {
            label.push(' ');
            label.push_str(set.name());
        }
        let deepest = path.last().copied().unwrap_or(self);
        deepest.help(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use crate::value::Value;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn detects_mode_from_environment() {
        assert_eq!(Mode::detect(&env(&[])), Mode::Normal);
        assert_eq!(Mode::detect(&env(&[(COMPLETION_ENV, "1")])), Mode::EmitCompletions);
        assert_eq!(Mode::detect(&env(&[(COMPLETION_SCRIPT_ENV, " 1 ")])), Mode::EmitScript);
        assert_eq!(
            Mode::detect(&env(&[(COMPLETION_ENV, "1"), (COMPLETION_SCRIPT_ENV, "1")])),
            Mode::EmitCompletions
        );
        assert_eq!(Mode::detect(&env(&[(COMPLETION_ENV, "yes")])), Mode::Normal);
    }

    fn app() -> FlagSet {
        let mut root = FlagSet::new("app");
        root.register(Flag::new(Value::Bool(false)).short('v').long("verbose"))
            .unwrap();
        let mut serve = FlagSet::new("serve");
        serve
            .register(Flag::new(Value::uint(16)).long("port").help("Listen port"))
            .unwrap();
        root.add_command(serve);
        root
    }

    #[test]
    fn help_comes_from_the_set_that_saw_it() {
        let mut root = app();
        match root.run(Mode::Normal, "app", &["-v", "serve", "--help"]).unwrap() {
            Outcome::Help(text) => {
                assert!(text.starts_with("Usage of app serve:\n"));
                assert!(text.contains("--port"));
                assert!(!text.contains("--verbose"));
            }
            other => panic!("expected help, got: {other:?}"),
        }

        let mut root = app();
        match root.run(Mode::Normal, "app", &["-h"]).unwrap() {
            Outcome::Help(text) => assert!(text.contains("Commands:\n  serve\n")),
            other => panic!("expected help, got: {other:?}"),
        }
    }

    #[test]
    fn completion_mode_leaves_registry_untouched() {
        let mut root = app();
        let out = root
            .run(Mode::EmitCompletions, "app", &["-v", ""])
            .unwrap();
        assert_eq!(out, Outcome::Completions(vec!["serve".to_string()]));
        assert!(!root.is_set("verbose"));
    }

    #[test]
    fn script_mode_and_errors() {
        let mut root = app();
        match root.run(Mode::EmitScript, "/bin/app", &[] as &[&str]).unwrap() {
            Outcome::Script(script) => assert!(script.contains("complete -F _app")),
            other => panic!("expected script, got: {other:?}"),
        }
        assert!(root.run(Mode::Normal, "app", &["nope"]).is_err());
        assert_eq!(root.run(Mode::Normal, "app", &["-v"]).unwrap(), Outcome::Parsed);
    }
}
