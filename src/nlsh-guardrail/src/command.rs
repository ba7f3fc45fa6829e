//! Whitespace tokenization and path normalization for command text.

use std::path::Path;

/// `sudo` options that consume the following word.
const SUDO_VALUE_FLAGS: &[&str] = &["-u", "-g", "-h", "-p", "-C", "-U", "-D"];

/// A command split on whitespace. No shell grammar is applied.
#[derive(Debug, Clone)]
pub(crate) struct CommandWords<'a> {
    /// Trimmed command text.
    pub raw: &'a str,
    /// Whitespace-separated tokens.
    pub tokens: Vec<&'a str>,
}

impl<'a> CommandWords<'a> {
    pub(crate) fn new(raw: &'a str) -> Self {
        Self {
            raw,
            tokens: raw.split_whitespace().collect(),
        }
    }

    /// Index of the program word, skipping a leading `sudo` and its options.
    fn program_index(&self) -> Option<usize> {
        let first = self.tokens.first()?;
        if basename(first) != "sudo" {
            return Some(0);
        }
        let mut i = 1;
        while let Some(token) = self.tokens.get(i) {
            if !token.starts_with('-') {
                return Some(i);
            }
            // `-u root` takes the next word; `-uroot` does not.
            i += if SUDO_VALUE_FLAGS.contains(token) { 2 } else { 1 };
        }
        None
    }

    /// First word, skipping a leading `sudo`, reduced to its basename.
    pub(crate) fn program(&self) -> Option<&'a str> {
        self.program_index().map(|i| basename(self.tokens[i]))
    }

    /// Tokens after the program word.
    pub(crate) fn args(&self) -> &[&'a str] {
        let start = self
            .program_index()
            .map_or(self.tokens.len(), |i| i + 1);
        &self.tokens[start..]
    }

    /// Simple commands joined by `;`, `|`, `||` or `&&`, in order.
    pub(crate) fn segments(&self) -> Vec<CommandWords<'a>> {
        self.raw
            .split([';', '|'])
            .flat_map(|part| part.split("&&"))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(CommandWords::new)
            .collect()
    }

    /// Returns true if any token, reduced to its basename, equals `word`.
    pub(crate) fn mentions_command(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| basename(t) == word)
    }
}

/// Strip a leading directory from a command word (`/bin/rm` -> `rm`).
pub(crate) fn basename(word: &str) -> &str {
    let word = trim_quotes(word);
    Path::new(word)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(word)
}

fn trim_quotes(token: &str) -> &str {
    token.trim_matches(|c| c == '"' || c == '\'')
}

/// Expand `~`, `$HOME` and `${HOME}` prefixes.
pub(crate) fn expand_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    let home = home.to_string_lossy();
    for prefix in ["${HOME}", "$HOME", "~"] {
        if let Some(rest) = path.strip_prefix(prefix)
            && (rest.is_empty() || rest.starts_with('/'))
        {
            return format!("{home}{rest}");
        }
    }
    path.to_string()
}

/// Normalize a path-like token for comparison.
pub(crate) fn normalize_path(token: &str, home: Option<&Path>) -> String {
    let mut normalized = expand_home(trim_quotes(token), home).replace("//", "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Returns true if `token` names `path` or something below it.
pub(crate) fn token_within(token: &str, path: &str, home: Option<&Path>) -> bool {
    let normalized = normalize_path(token, home);
    normalized == path || normalized.starts_with(&format!("{path}/"))
}

/// Returns true if `path` appears in `text` as a whole path component run.
///
/// `/usr` is found in `ls /usr/lib` but not in `/home/me/usrdata`.
pub(crate) fn mentions_path(text: &str, path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    text.match_indices(path).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + path.len()..].chars().next();
        let starts_clean = before.is_none_or(|c| c.is_whitespace() || "'\"=:(".contains(c));
        let ends_clean = after.is_none_or(|c| c.is_whitespace() || "/'\";)&|".contains(c));
        starts_clean && ends_clean
    })
}
