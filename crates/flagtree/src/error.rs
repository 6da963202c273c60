//! Error types for flag registration and parsing.

use thiserror::Error;

/// Errors raised while registering or parsing flags.
///
/// Every variant carries the name of the [`FlagSet`](crate::FlagSet) that
/// produced it, so a message stays unambiguous after it has unwound through
/// several subcommand levels.
#[derive(Debug, Error)]
pub enum FlagError {
    /// `-h` or `--help` was seen. Not a failure: callers print usage and exit 0.
    #[error("{set}: help requested")]
    HelpRequested { set: String },

    /// A flag token did not match any registered name.
    #[error("{set}: {flag} flag is undefined")]
    UndefinedFlag { set: String, flag: String },

    /// A value-taking flag was the last token and had no `=value`.
    #[error("{set}: {flag} flag value was not provided")]
    MissingValue { set: String, flag: String },

    /// A short or long name is already taken (or reserved).
    #[error("{set}: {name} flag redefined")]
    RedefinedFlag { set: String, name: String },

    /// A flag was registered with neither a short nor a long name.
    #[error("{set}: flag name undefined")]
    UnnamedFlag { set: String },

    /// The first positional token did not name a registered subcommand.
    #[error("{set}: unknown command: {command}")]
    UnknownCommand { set: String, command: String },

    /// A value (or a default) could not be converted by the flag's Value.
    #[error("{set}: invalid value {value:?} for {flag}: {source}")]
    ValueConversion {
        set: String,
        flag: String,
        value: String,
        #[source]
        source: ValueError,
    },
}

impl FlagError {
    /// Whether this is a help request rather than a genuine failure.
    pub fn is_help(&self) -> bool {
        matches!(self, Self::HelpRequested { .. })
    }

    /// Name of the flag set that raised the error.
    pub fn set_name(&self) -> &str {
        match self {
            Self::HelpRequested { set }
            | Self::UndefinedFlag { set, .. }
            | Self::MissingValue { set, .. }
            | Self::RedefinedFlag { set, .. }
            | Self::UnnamedFlag { set }
            | Self::UnknownCommand { set, .. }
            | Self::ValueConversion { set, .. } => set,
        }
    }
}

/// Conversion failures reported by [`Value::set`](crate::Value::set).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("invalid boolean {0:?}")]
    InvalidBool(String),

    #[error("invalid integer {0:?}")]
    InvalidInt(String),

    #[error("{value:?} is out of range for a {bits}-bit integer")]
    OutOfRange { value: String, bits: u32 },

    #[error("invalid float {0:?}")]
    InvalidFloat(String),

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    /// Raised by user-defined values.
    #[error("{0}")]
    Custom(String),
}

/// Result type for flag operations.
pub type Result<T> = std::result::Result<T, FlagError>;
