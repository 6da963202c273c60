//! Serializable snapshot of a flag registry.

use serde::{Deserialize, Serialize};

use crate::flag::Flag;
use crate::flagset::FlagSet;
use crate::value::ValueKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meta_var: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub boolean: bool,
}

/// A flag set with its flags sorted by display name and its subcommands
/// sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSchema>,
}

impl FlagSchema {
    /// The name a user would sort by: long name, else short name.
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl From<&Flag> for FlagSchema {
    fn from(flag: &Flag) -> Self {
        Self {
            short: flag.short_name(),
            long: flag.long_name().map(str::to_string),
            meta_var: flag.meta_var().to_string(),
            help: flag.help_text().to_string(),
            default_value: flag.default_text().to_string(),
            kind: flag.value().kind(),
            boolean: flag.is_boolean(),
        }
    }
}

impl FlagSet {
    pub fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name.clone(),
            usage: self.usage.clone(),
            flags: self
                .sorted_flags()
                .into_iter()
                .map(FlagSchema::from)
                .collect(),
            commands: self
                .command_names()
                .into_iter()
                .filter_map(|name| self.commands.get(name))
                .map(FlagSet::schema)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn registry() -> FlagSet {
        let mut root = FlagSet::new("app").with_usage("app [OPTIONS] <COMMAND>");
        root.register(Flag::new(Value::Bool(false)).short('v').long("verbose"))
            .unwrap()
            .register(
                Flag::new(Value::String(String::new()))
                    .long("config=FILE")
                    .help("Config path")
                    .default_value("app.toml"),
            )
            .unwrap();
        root.add_command(FlagSet::new("zeta"))
            .add_command(FlagSet::new("alpha"));
        root
    }

    #[test]
    fn snapshot_is_sorted() {
        let schema = registry().schema();
        let longs: Vec<_> = schema.flags.iter().map(|f| f.display_name()).collect();
        assert_eq!(longs, ["config", "verbose"]);
        let commands: Vec<_> = schema.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(commands, ["alpha", "zeta"]);
    }

    #[test]
    fn serializes_kebab_case_and_skips_empty_fields() {
        let json = serde_json::to_value(registry().schema()).unwrap();
        let config = &json["flags"][0];
        assert_eq!(config["long"], "config");
        assert_eq!(config["meta-var"], "FILE");
        assert_eq!(config["default-value"], "app.toml");
        assert_eq!(config["kind"], "string");
        assert!(config.get("short").is_none());

        let verbose = &json["flags"][1];
        assert_eq!(verbose["boolean"], true);
        assert!(verbose.get("help").is_none());

        // Leaf commands carry no flag or command arrays.
        assert!(json["commands"][0].get("flags").is_none());
    }

    #[test]
    fn deserializes_back() {
        let schema = registry().schema();
        let text = serde_json::to_string(&schema).unwrap();
        let back: CommandSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(back, schema);
    }
}
