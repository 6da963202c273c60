//! The tokenizer.
//!
//! Supported syntax:
//! - `-f`           boolean only
//! - `-abc`         cluster of booleans, the last may take the rest as value
//! - `-fvalue`      value glued to a short flag
//! - `-f value`     value in the next token
//! - `--flag`       boolean only
//! - `--flag=value` any flag
//! - `--flag value` non-boolean only
//! - `--`           everything after is positional
//! - `-h`, `--help` help request

use crate::error::{FlagError, Result};
use crate::flagset::FlagSet;

impl FlagSet {
    /// Parse `arguments` (without the program name).
    ///
    /// Binds every recognized flag, applies defaults to flags that were not
    /// seen, records the positional remainder as [`args`](Self::args), and
    /// hands it to a matching subcommand if this set has any. The isSet
    /// markers and the selected subcommand are reset first, so a set can be
    /// parsed again; Value contents are not reset.
    pub fn parse<S: AsRef<str>>(&mut self, arguments: &[S]) -> Result<()> {
        let arguments: Vec<String> = arguments.iter().map(|s| s.as_ref().to_string()).collect();

        self.reset();
        self.parse_flags(&arguments)?;
        self.apply_defaults()?;
        self.dispatch()
    }

    fn reset(&mut self) {
        for flag in &mut self.flags {
            flag.reset();
        }
        self.args.clear();
        self.active = None;
    }

    fn parse_flags(&mut self, arguments: &[String]) -> Result<()> {
        let mut window = arguments;

        while let Some(token) = window.first() {
            let token = token.as_str();

            if token == "-h" || token == "--help" {
                return Err(FlagError::HelpRequested {
                    set: self.name.clone(),
                });
            }

            if token == "--" {
                window = &window[1..];
                break;
            }

            let shift = if let Some(body) = token.strip_prefix("--") {
                self.parse_long(body, window)?
            } else if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) {
                self.parse_short(cluster, window)?
            } else {
                break;
            };
            tracing::trace!(set = %self.name, token, shift, "consumed flag token");
            window = &window[shift..];
        }

        self.args = window.to_vec();
        Ok(())
    }

    /// Handle `--name`, `--name=value` or `--name value`; returns tokens consumed.
    fn parse_long(&mut self, body: &str, window: &[String]) -> Result<usize> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let token = format!("--{name}");

        let Some(&idx) = self.long.get(name) else {
            return Err(FlagError::UndefinedFlag {
                set: self.name.clone(),
                flag: token,
            });
        };

        // `=value` wins over the implicit `true` of boolean flags.
        let (value, shift) = match inline {
            Some(value) => (value, 1),
            None if self.flags[idx].is_boolean() => ("true", 1),
            None => match window.get(1) {
                Some(next) => (next.as_str(), 2),
                None => {
                    return Err(FlagError::MissingValue {
                        set: self.name.clone(),
                        flag: token,
                    });
                }
            },
        };

        self.set_flag(idx, &token, value)?;
        Ok(shift)
    }

    /// Handle a short cluster (the token minus its leading `-`); returns tokens consumed.
    fn parse_short(&mut self, cluster: &str, window: &[String]) -> Result<usize> {
        let mut rest = cluster;

        while let Some(c) = rest.chars().next() {
            let after = &rest[c.len_utf8()..];
            let token = format!("-{c}");

            let Some(&idx) = self.short.get(&c) else {
                return Err(FlagError::UndefinedFlag {
                    set: self.name.clone(),
                    flag: token,
                });
            };

            if self.flags[idx].is_boolean() {
                self.set_flag(idx, &token, "true")?;
                rest = after;
            } else if !after.is_empty() {
                self.set_flag(idx, &token, after)?;
                return Ok(1);
            } else if let Some(next) = window.get(1) {
                self.set_flag(idx, &token, next)?;
                return Ok(2);
            } else {
                return Err(FlagError::MissingValue {
                    set: self.name.clone(),
                    flag: token,
                });
            }
        }

        Ok(1)
    }

    fn set_flag(&mut self, idx: usize, token: &str, raw: &str) -> Result<()> {
        self.flags[idx]
            .apply(raw)
            .map_err(|source| FlagError::ValueConversion {
                set: self.name.clone(),
                flag: token.to_string(),
                value: raw.to_string(),
                source,
            })
    }

    fn apply_defaults(&mut self) -> Result<()> {
        for flag in &mut self.flags {
            match flag.apply_default() {
                Ok(true) => {
                    tracing::debug!(set = %self.name, flag = %flag, default = flag.default_text(), "applied default");
                }
                Ok(false) => {}
                Err(source) => {
                    return Err(FlagError::ValueConversion {
                        set: self.name.clone(),
                        flag: flag.token(),
                        value: flag.default_text().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}
