use std::fs;
use std::path::Path;

/// Complete the word under the cursor as a filesystem path.
///
/// Directories get a trailing `/` so the shell can keep descending.
pub fn paths(args: &[String]) -> Vec<String> {
    let word = args.last().map(String::as_str).unwrap_or("");
    let (dir, prefix) = match word.rfind('/') {
        Some(pos) => (&word[..=pos], &word[pos + 1..]),
        None => ("", word),
    };
    let search = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };

    let entries = match fs::read_dir(search) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %search.display(), error = %err, "path completion skipped");
            return Vec::new();
        }
    };

    let mut out: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(prefix) || (name.starts_with('.') && !prefix.starts_with('.')) {
                return None;
            }
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            Some(format!("{dir}{name}{}", if is_dir { "/" } else { "" }))
        })
        .collect();
    out.sort();
    out
}
