//! POSIX-style flag parsing with typed values, subcommands and shell completion.
//!
//! One [`FlagSet`] registry drives three things: parsing an argument
//! vector, dispatching to nested subcommands, and answering shell
//! completion requests.
//!
//! # Example
//!
//! ```rust
//! use flagtree::{Flag, FlagSet, Value};
//!
//! let mut root = FlagSet::new("app");
//! root.register(Flag::new(Value::Bool(false)).short('v').long("verbose"))?;
//!
//! let mut serve = FlagSet::new("serve");
//! serve.register(Flag::new(Value::uint(16)).short('p').long("port").default_value("8080"))?;
//! root.add_command(serve);
//!
//! root.parse(&["-v", "serve", "-p", "9000", "extra"])?;
//! assert_eq!(root.value_of::<bool>("verbose"), Some(true));
//!
//! let serve = root.active_command().unwrap();
//! assert_eq!(serve.value_of::<u16>("port"), Some(9000));
//! assert_eq!(serve.args(), ["extra"]);
//! # Ok::<(), flagtree::FlagError>(())
//! ```
//!
//! Programs usually go through [`FlagSet::run`] with a [`Mode`] detected from
//! the environment, so the same binary also serves its own completions.

extern crate self as flagtree;

mod bind;
mod completion;
mod dispatch;
mod error;
mod flag;
mod flagset;
mod help;
mod mode;
mod parse;
mod schema;
mod value;

pub use bind::{FlagField, Flags};
pub use completion::bash_script;
pub use error::{FlagError, Result, ValueError};
pub use flag::{Completer, DEFAULT_META_VAR, Flag, ShortName};
pub use flagset::{FlagSet, HELP_LONG, HELP_SHORT};
pub use help::render as render_help;
pub use mode::{COMPLETION_ENV, COMPLETION_SCRIPT_ENV, EnvReader, Mode, Outcome, ProcessEnv};
pub use schema::{CommandSchema, FlagSchema};
pub use value::{CustomValue, Value, ValueKind};

/// Derive [`Flags`] for a struct with named fields.
///
/// Every field becomes one flag. Field attributes:
///
/// - `#[flag(short = 'v')]`: short name
/// - `#[flag(long = "name")]`: long name, defaults to the field name in kebab-case
/// - `#[flag(default = "..")]`: default text applied when the flag is absent
/// - `#[flag(help = "..")]`, `#[flag(meta = "FILE")]`
/// - `#[flag(complete = path::to_fn)]`: completion callback
/// - `#[flag(skip)]`: not a flag
pub use flagtree_derive::Flags;
