//! Dry-run suggestions and undo hints for risky commands.

use crate::command::CommandWords;

/// Recovery guidance keyed by topic. Kept sorted by key.
const UNDO_HINTS: &[(&str, &str)] = &[
    (
        "git",
        "Use `git reflog` to find the previous HEAD, then `git restore` or `git reset` to recover.",
    ),
    (
        "kubectl",
        "Use `kubectl rollout undo <resource>` to revert a rollout.",
    ),
    (
        "rm",
        "Deleted files are not recoverable from the shell; restore from a backup or use `git checkout -- <path>` for tracked files.",
    ),
];

/// Suggest a safer command to run first, for the first segment that has one.
pub(crate) fn dry_run_suggestion(words: &CommandWords<'_>) -> Option<String> {
    words.segments().iter().find_map(segment_suggestion)
}

fn segment_suggestion(words: &CommandWords<'_>) -> Option<String> {
    let program = words.program()?;
    let args = words.args();

    match program {
        "kubectl" => {
            let applies = args.iter().any(|a| *a == "apply");
            let has_dry_run = args.iter().any(|a| a.starts_with("--dry-run"));
            (applies && !has_dry_run).then(|| format!("{} --dry-run=client", words.raw))
        }
        "git" => {
            let subcommand = args.iter().find(|a| !a.starts_with('-'));
            (subcommand != Some(&"status")).then(|| "git status".to_string())
        }
        "rm" => {
            let targets: Vec<&str> = args
                .iter()
                .copied()
                .filter(|a| !a.starts_with('-'))
                .collect();
            (!targets.is_empty()).then(|| format!("ls -la {}", targets.join(" ")))
        }
        _ => None,
    }
}

/// One hint per topic mentioned anywhere in the command.
pub(crate) fn undo_hints(words: &CommandWords<'_>) -> Vec<String> {
    UNDO_HINTS
        .iter()
        .filter(|(topic, _)| words.mentions_command(topic))
        .map(|(_, hint)| (*hint).to_string())
        .collect()
}
