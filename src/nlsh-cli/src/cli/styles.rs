//! CLI styling and formatting.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Styled help theme.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with examples, environment variables and paths.
pub const AFTER_HELP: &str = r#"EXAMPLES
    nlsh find files over 100MB in my home     Generate, assess and maybe run
    nlsh --preview delete all node_modules    Show the command only
    nlsh -y list open ports                   Run right away if assessed safe
    nlsh check "rm -rf ./build"               Assess a command you wrote

ENVIRONMENT VARIABLES
    NLSH_HOME         Data directory (default: ~/.nlsh)
    NLSH_CONFIG       Configuration file (default: $NLSH_HOME/config.yaml)
    NLSH_LOG_LEVEL    Log verbosity (error, warn, info, debug, trace)
    RUST_LOG          Standard tracing filter, applied to other crates

PATHS
    Config        ~/.nlsh/config.yaml
    Guardrails    ~/.nlsh/guardrails.yaml
    History       ~/.nlsh/history.jsonl
    Cache         ~/.cache/nlsh/"#;
