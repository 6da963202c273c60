//! Shell completion derived from the same registry used for parsing.
//!
//! Completion never runs the real parser: a lenient scan classifies the
//! argument window without touching any Value, then candidates come either
//! from a flag's completion callback (value position) or from the flag and
//! subcommand names.

use std::collections::HashSet;
use std::path::Path;

use crate::flagset::FlagSet;
use crate::mode::COMPLETION_ENV;

/// What a lenient scan found in a completion window.
struct Scan {
    /// Flags consumed by tokens before the cursor word.
    consumed: HashSet<usize>,
    /// Index where the positional remainder starts.
    rest: usize,
    /// Flag whose value is the cursor word, when the token before the
    /// cursor is a value-taking flag in the flag region.
    pending: Option<usize>,
}

impl FlagSet {
    /// Completion candidates for `arguments`, whose last element is the word
    /// under the cursor (possibly empty). Does not mutate the set.
    pub fn complete<S: AsRef<str>>(&self, arguments: &[S]) -> Vec<String> {
        let arguments: Vec<String> = arguments.iter().map(|s| s.as_ref().to_string()).collect();
        self.complete_window(&arguments)
    }

    fn complete_window(&self, args: &[String]) -> Vec<String> {
        let scan = self.scan(args);
        let rest = &args[scan.rest..];

        if let Some(first) = rest.first() {
            if let Some(child) = self.commands.get(first) {
                if rest.len() == 1 {
                    // The cursor sits right after a complete subcommand name.
                    return vec![first.clone()];
                }
                tracing::debug!(set = %self.name, command = %first, "completing inside subcommand");
                return child.complete_window(&rest[1..]);
            }
        }

        if let Some(values) = scan.pending.and_then(|idx| self.flags[idx].complete(args)) {
            tracing::debug!(set = %self.name, count = values.len(), "value completion");
            return values;
        }

        let cursor_is_flag = args.last().is_some_and(|w| w.starts_with('-'));
        if !rest.is_empty() && !cursor_is_flag && self.commands.is_empty() {
            if let Some(completer) = &self.completer {
                tracing::debug!(set = %self.name, "positional completion");
                return completer(args);
            }
        }

        self.name_candidates(&scan.consumed)
    }

    fn name_candidates(&self, consumed: &HashSet<usize>) -> Vec<String> {
        let mut order: Vec<usize> = (0..self.flags.len()).collect();
        order.sort_by_key(|&idx| self.flags[idx].display_name());

        let mut out = Vec::new();
        for idx in order {
            let flag = &self.flags[idx];
            if consumed.contains(&idx) && !flag.value().is_list() {
                continue;
            }
            if let Some(short) = flag.short_name() {
                out.push(format!("-{short} "));
            }
            if let Some(long) = flag.long_name() {
                out.push(format!("--{long} "));
            }
        }
        out.extend(self.command_names().into_iter().map(str::to_string));
        out
    }

    /// Walk the window like the parser does, but never fail and never set.
    fn scan(&self, args: &[String]) -> Scan {
        let cursor = args.len().saturating_sub(1);
        let mut consumed = HashSet::new();
        let mut pending = None;
        let mut i = 0;

        while i < args.len() {
            let token = args[i].as_str();
            let mut shift = 1;
            let mut taker = None;

            if token == "--" {
                return Scan {
                    consumed,
                    rest: i + 1,
                    pending,
                };
            } else if let Some(body) = token.strip_prefix("--") {
                let (name, inline) = match body.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (body, None),
                };
                if let Some(&idx) = self.long.get(name) {
                    if i < cursor {
                        consumed.insert(idx);
                    }
                    if inline.is_none() && !self.flags[idx].is_boolean() {
                        shift = 2;
                        taker = Some(idx);
                    }
                }
            } else if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) {
                for (pos, c) in cluster.char_indices() {
                    let Some(&idx) = self.short.get(&c) else {
                        break;
                    };
                    if i < cursor {
                        consumed.insert(idx);
                    }
                    if self.flags[idx].is_boolean() {
                        continue;
                    }
                    if pos + c.len_utf8() == cluster.len() {
                        shift = 2;
                        taker = Some(idx);
                    }
                    break;
                }
            } else {
                return Scan {
                    consumed,
                    rest: i,
                    pending,
                };
            }

            if shift == 2 && i + 1 == cursor {
                pending = taker;
            }
            i += shift;
        }

        Scan {
            consumed,
            rest: args.len(),
            pending,
        }
    }
}

const SCRIPT_TEMPLATE: &str = r#"
CMD="@PROGRAM@"

function _@BASE@(){
  local cur prev cword words
  _get_comp_words_by_ref -n =: cur words
  OPTS=($(@ENV@=1 "${words[@]}"))
  COMPREPLY=($(compgen -W "${OPTS[*]}" -- ${cur}))
  return 0
}

complete -F _@BASE@ $CMD
"#;

/// Bash snippet that wires `program` into the shell's completion.
///
/// The snippet re-runs the program with the completion signal set and the
/// words typed so far, and offers whatever it prints.
pub fn bash_script(program: &str) -> String {
    let base = Path::new(program)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(program);
    let base: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    SCRIPT_TEMPLATE
        .replace("@PROGRAM@", program)
        .replace("@BASE@", &base)
        .replace("@ENV@", COMPLETION_ENV)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use crate::value::Value;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    fn simple_set() -> FlagSet {
        let mut set = FlagSet::new("app");
        set.register(Flag::new(Value::Bool(false)).short('v').long("verbose"))
            .unwrap()
            .register(Flag::new(Value::String(String::new())).short('o').long("output"))
            .unwrap();
        set
    }

    #[test]
    fn lists_flag_names_when_no_value_context() {
        let set = simple_set();
        let got = set.complete(&[""]);
        assert_eq!(
            sorted(got.clone()),
            sorted(vec!["-v ".into(), "--verbose ".into(), "-o ".into(), "--output ".into()])
        );
        // Sorted by display name: output before verbose.
        assert_eq!(got, ["-o ", "--output ", "-v ", "--verbose "]);
    }

    #[test]
    fn value_position_uses_the_flag_callback() {
        let mut set = FlagSet::new("app");
        set.register(Flag::new(Value::Bool(false)).short('v').long("verbose"))
            .unwrap()
            .register(
                Flag::new(Value::String(String::new()))
                    .short('o')
                    .long("output")
                    .completer(|_| vec!["a.txt".to_string(), "b.txt".to_string()]),
            )
            .unwrap();

        assert_eq!(set.complete(&["-o", ""]), ["a.txt", "b.txt"]);
        assert_eq!(set.complete(&["-v", "--output", "b"]), ["a.txt", "b.txt"]);
    }

    #[test]
    fn value_position_respects_name_tables() {
        let mut set = FlagSet::new("app");
        set.register(
            Flag::new(Value::String(String::new()))
                .short('o')
                .completer(|_| vec!["a.txt".to_string()]),
        )
        .unwrap()
        .register(Flag::new(Value::Bool(false)).long("o"))
        .unwrap();

        assert_eq!(set.complete(&["-o", ""]), ["a.txt"]);
        // The consumed long `--o` is dropped; the short `-o` is still offered.
        assert_eq!(set.complete(&["--o", ""]), ["-o "]);
    }

    #[test]
    fn value_position_follows_parser_classification() {
        let mut set = FlagSet::new("app").with_completer(|_| vec!["positional".to_string()]);
        set.register(
            Flag::new(Value::String(String::new()))
                .short('o')
                .completer(|_| vec!["a.txt".to_string()]),
        )
        .unwrap();

        // After the terminator `-o` is a positional.
        assert_eq!(set.complete(&["--", "-o", ""]), ["positional"]);
        // The second `-o` is the value of the first.
        assert_eq!(set.complete(&["-o", "-o", ""]), ["positional"]);
        // A glued value leaves nothing pending.
        assert_eq!(set.complete(&["-ox", ""]), ["positional"]);
        assert_eq!(set.complete(&["-o", "x", "-o", ""]), ["a.txt"]);
    }

    #[test]
    fn value_flag_without_callback_falls_back_to_names() {
        let set = simple_set();
        let got = set.complete(&["-o", ""]);
        assert!(got.contains(&"--verbose ".to_string()));
    }

    #[test]
    fn boolean_flag_before_cursor_is_not_a_value_context() {
        let mut set = FlagSet::new("app");
        set.register(
            Flag::new(Value::Bool(false))
                .short('v')
                .completer(|_| vec!["never".to_string()]),
        )
        .unwrap();
        assert_eq!(set.complete(&["-v", ""]), Vec::<String>::new());
    }

    #[test]
    fn consumed_flags_are_dropped_unless_repeatable() {
        let mut set = simple_set();
        set.register(Flag::new(Value::StringList(Vec::new())).long("tag"))
            .unwrap();
        let got = set.complete(&["-v", "--tag=x", ""]);
        assert!(!got.contains(&"--verbose ".to_string()));
        assert!(got.contains(&"--tag ".to_string()));

        // The word under the cursor does not count as consumed.
        let got = set.complete(&["--verbose"]);
        assert!(got.contains(&"--verbose ".to_string()));
    }

    #[test]
    fn completion_does_not_mutate() {
        let set = simple_set();
        let _ = set.complete(&["-v", "-o", "x", ""]);
        assert_eq!(set.value_of::<bool>("verbose"), Some(false));
        assert!(!set.is_set("verbose"));
    }

    fn tree() -> FlagSet {
        let mut root = simple_set();
        let mut serve = FlagSet::new("serve");
        serve
            .register(
                Flag::new(Value::uint(16))
                    .long("port")
                    .completer(|_| vec!["80".to_string(), "8080".to_string()]),
            )
            .unwrap();
        root.add_command(serve).add_command(FlagSet::new("build"));
        root
    }

    #[test]
    fn subcommand_names_follow_flag_names() {
        let got = tree().complete(&["-v", ""]);
        assert_eq!(got, ["-o ", "--output ", "build", "serve"]);
    }

    #[test]
    fn complete_subcommand_name_short_circuits() {
        assert_eq!(tree().complete(&["-v", "serve"]), ["serve"]);
    }

    #[test]
    fn recurses_into_selected_subcommand() {
        let root = tree();
        assert_eq!(root.complete(&["serve", ""]), ["--port "]);
        assert_eq!(root.complete(&["-v", "serve", "--port", ""]), ["80", "8080"]);
    }

    #[test]
    fn partial_subcommand_lists_everything() {
        let got = tree().complete(&["se"]);
        assert!(got.contains(&"serve".to_string()));
        assert!(got.contains(&"--verbose ".to_string()));
    }

    #[test]
    fn lenient_scan_skips_unknown_flags() {
        let got = tree().complete(&["--bogus", "serve", ""]);
        assert_eq!(got, ["--port "]);
    }

    #[test]
    fn positional_completer_applies_without_subcommands() {
        let set = simple_set().with_completer(|args| vec![format!("file{}", args.len())]);
        assert_eq!(set.complete(&["-v", "x"]), ["file2"]);
        assert_eq!(set.complete(&[""]), ["file1"]);
        // A dash under the cursor is still served from names.
        assert!(set.complete(&["-"]).contains(&"--output ".to_string()));
    }

    #[test]
    fn script_is_parameterized_by_program() {
        let script = bash_script("/usr/local/bin/my-app");
        assert!(script.contains("CMD=\"/usr/local/bin/my-app\""));
        assert!(script.contains("function _my_app()"));
        assert!(script.contains("complete -F _my_app $CMD"));
        assert!(script.contains("FLAGTREE_COMPLETION=1 \"${words[@]}\""));
    }
}
