//! Usage text rendered from a [`CommandSchema`].

use crate::flagset::{FlagSet, HELP_LONG, HELP_SHORT};
use crate::schema::{CommandSchema, FlagSchema};

/// Help lines are broken once they grow past this many bytes.
const WRAP: usize = 50;

impl FlagSet {
    /// Render usage text for this set, headed by `program`.
    pub fn help(&self, program: &str) -> String {
        render(&self.schema(), program)
    }
}

/// Render usage text for a schema snapshot.
pub fn render(schema: &CommandSchema, program: &str) -> String {
    let mut out = format!("Usage of {program}:\n");
    if !schema.usage.trim().is_empty() {
        out.push_str(&format!("  {}\n", schema.usage.trim()));
    }

    let mut rows: Vec<(String, Vec<String>)> = vec![(
        format!("-{HELP_SHORT}, --{HELP_LONG}"),
        vec!["print this message".to_string()],
    )];
    rows.extend(schema.flags.iter().map(|f| (format_left(f), format_help(f))));
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    out.push_str("\nOptions:\n");
    for (left, lines) in rows {
        let mut lines = lines.into_iter();
        match lines.next() {
            Some(first) => out.push_str(&format!("  {left:width$}  {first}\n")),
            None => out.push_str(&format!("  {left}\n")),
        }
        for line in lines {
            out.push_str(&format!("  {:width$}  {line}\n", ""));
        }
    }

    if !schema.commands.is_empty() {
        out.push_str("\nCommands:\n");
        for command in &schema.commands {
            if command.usage.trim().is_empty() {
                out.push_str(&format!("  {}\n", command.name));
            } else {
                out.push_str(&format!("  {}  {}\n", command.name, command.usage.trim()));
            }
        }
    }

    out
}

fn format_left(flag: &FlagSchema) -> String {
    let meta = if flag.boolean { "" } else { flag.meta_var.as_str() };
    let with_meta = |name: String| {
        if meta.is_empty() {
            name
        } else {
            format!("{name} {meta}")
        }
    };

    match (flag.short, &flag.long) {
        (Some(short), Some(long)) => with_meta(format!("-{short}, --{long}")),
        (Some(short), None) => with_meta(format!("-{short}")),
        (None, Some(long)) => with_meta(format!("    --{long}")),
        (None, None) => String::new(),
    }
}

fn format_help(flag: &FlagSchema) -> Vec<String> {
    let mut lines = wrap(&flag.help);
    if !flag.default_value.is_empty() {
        lines.push(format!("(default: {})", flag.default_value));
    }
    lines
}

/// Greedy word wrap: a line is emitted as soon as it exceeds [`WRAP`].
fn wrap(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
        if line.len() > WRAP {
            lines.push(std::mem::take(&mut line));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
