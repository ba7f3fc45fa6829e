//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::styles::{AFTER_HELP, get_styles};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// nlsh - turn a request into a shell command, check it, and maybe run it.
#[derive(Parser, Debug)]
#[command(name = "nlsh")]
#[command(author, version)]
#[command(about = "Natural language to shell commands, with guardrails", long_about = None)]
#[command(
    styles = get_styles(),
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true,
    override_usage = "nlsh [OPTIONS] <PROMPT>...\n       nlsh <COMMAND> [ARGS]",
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        short = 'L',
        value_enum,
        default_value = "warn",
        global = true,
        help_heading = "Debugging"
    )]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "log-json", global = true, help_heading = "Debugging")]
    pub log_json: bool,

    /// Enable debug mode: writes ALL trace-level logs to ./nlsh-debug.log
    #[arg(long = "debug", global = true, help_heading = "Debugging")]
    pub debug: bool,

    /// Configuration file (default: $NLSH_CONFIG, $NLSH_HOME/config.yaml, ~/.nlsh/config.yaml)
    #[arg(long = "config", value_name = "PATH", global = true, env = "NLSH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub query: QueryArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments for a query.
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Model to use instead of the configured default
    #[arg(short, long, help_heading = "Model")]
    pub model: Option<String>,

    /// Stream the model response
    #[arg(long = "stream", help_heading = "Model")]
    pub stream: bool,

    /// Do not read or write the response cache
    #[arg(long = "no-cache", help_heading = "Model")]
    pub no_cache: bool,

    /// Show the command and its assessment without running it
    #[arg(long = "preview", help_heading = "Execution")]
    pub preview: bool,

    /// Run commands assessed as safe without asking
    #[arg(short = 'y', long = "yes", help_heading = "Execution")]
    pub yes: bool,

    /// Copy the generated command to the clipboard
    #[arg(long = "copy", help_heading = "Execution")]
    pub copy: bool,

    /// Overall timeout for the request, in seconds
    #[arg(long = "timeout", value_name = "SECONDS", help_heading = "Execution")]
    pub timeout: Option<u64>,

    /// Directory the command is meant for
    #[arg(long = "cd", short = 'C', value_name = "DIR", help_heading = "Execution")]
    pub cwd: Option<PathBuf>,

    /// Print the response as JSON
    #[arg(long = "json", help_heading = "Output")]
    pub json: bool,

    /// What you want to do, in plain words
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub prompt: Vec<String>,
}

impl QueryArgs {
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ").trim().to_string()
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assess a command with the guardrail without running it
    #[command(visible_alias = "c", display_order = 1)]
    Check(CheckCommand),

    /// Show recent queries
    #[command(display_order = 2)]
    History(HistoryCommand),

    /// List configured models in candidate order
    #[command(display_order = 3)]
    Models(ModelsCommand),
}

/// Check command.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Print the assessment as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Command to assess
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// History command.
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Number of records to show
    #[arg(short = 'n', long = "limit", default_value_t = 20)]
    pub limit: usize,

    /// Print records as JSON lines
    #[arg(long = "json")]
    pub json: bool,
}

/// Models command.
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Show the candidate order for this model override
    #[arg(short, long)]
    pub model: Option<String>,
}
