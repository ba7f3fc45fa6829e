//! Extracting a command from model output.

use serde::Deserialize;

use super::Generation;

#[derive(Debug, Deserialize)]
struct JsonAnswer {
    command: String,
    #[serde(default)]
    reasoning: String,
}

/// Parse raw model output into a generation.
///
/// Accepted shapes, in order: a JSON object with `command` and optional
/// `reasoning`, a fenced code block, the first non-empty line. Returns `None`
/// when no command can be found.
pub fn parse_generation(content: &str) -> Option<Generation> {
    let reply = content.to_string();
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(answer) = parse_json(trimmed) {
        let command = answer.command.trim().to_string();
        if command.is_empty() {
            return None;
        }
        return Some(Generation {
            command,
            reasoning: answer.reasoning.trim().to_string(),
            reply,
        });
    }

    if let Some((command, outside)) = fenced_block(trimmed) {
        return Some(Generation {
            command,
            reasoning: outside,
            reply,
        });
    }

    let line = trimmed.lines().map(str::trim).find(|l| !l.is_empty())?;
    let command = line.strip_prefix("$ ").unwrap_or(line).trim_matches('`');
    if command.is_empty() {
        return None;
    }
    Some(Generation {
        command: command.to_string(),
        reasoning: String::new(),
        reply,
    })
}

fn parse_json(text: &str) -> Option<JsonAnswer> {
    if let Ok(answer) = serde_json::from_str::<JsonAnswer>(text) {
        return Some(answer);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// First fenced code block and the text around it.
fn fenced_block(text: &str) -> Option<(String, String)> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string (`bash`, `sh`, ...).
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;

    let command = body[..close].trim().to_string();
    if command.is_empty() {
        return None;
    }
    let before = text[..open].trim();
    let after = body[close + 3..].trim();
    let outside = [before, after]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    Some((command, outside))
}
