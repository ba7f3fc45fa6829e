//! Prompt rendering from a model's template messages.

use super::types::ChatMessage;
use crate::config::{ModelDefinition, PromptMessage};
use crate::context::ContextSnapshot;

/// System prompt used when a model does not define its own template.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You translate requests into a single shell command.
Environment:
- Operating system: {{os}}
- Shell: {{shell}}
- Working directory: {{cwd}}
- Available tools: {{tools}}
- Git: {{git}}
- Kubernetes: {{kubernetes}}
- Docker: {{docker}}

Respond with a JSON object of the form {\"command\": \"...\", \"reasoning\": \"...\"}.
The command must run as-is in the shell above. Prefer non-destructive commands.";

/// User message used when a model does not define its own template.
pub const DEFAULT_USER_PROMPT: &str = "{{prompt}}";

/// Template messages for a model, falling back to the built-in template.
pub fn template_for(model: &ModelDefinition) -> Vec<PromptMessage> {
    if model.prompt.is_empty() {
        vec![
            PromptMessage::new("system", DEFAULT_SYSTEM_PROMPT),
            PromptMessage::new("user", DEFAULT_USER_PROMPT),
        ]
    } else {
        model.prompt.clone()
    }
}

/// Render a model's template for one request.
pub fn render_messages(
    model: &ModelDefinition,
    prompt: &str,
    context: &ContextSnapshot,
) -> Vec<ChatMessage> {
    template_for(model)
        .into_iter()
        .map(|m| ChatMessage::new(m.role, render(&m.content, prompt, context)))
        .collect()
}

/// Substitute `{{...}}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, prompt: &str, context: &ContextSnapshot) -> String {
    let cwd = context.cwd.display().to_string();
    let replacements: [(&str, String); 8] = [
        ("{{prompt}}", prompt.to_string()),
        ("{{cwd}}", cwd),
        ("{{shell}}", context.shell.clone()),
        ("{{os}}", context.os.clone()),
        ("{{tools}}", context.tools_summary()),
        ("{{git}}", context.git_summary()),
        ("{{kubernetes}}", context.kubernetes_summary()),
        ("{{docker}}", context.docker_summary()),
    ];

    // Single pass so a prompt containing `{{cwd}}` is not expanded again.
    let mut out = String::with_capacity(template.len() + prompt.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match replacements.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}
