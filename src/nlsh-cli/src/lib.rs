//! nlsh CLI library.
//!
//! Wires the engine to the terminal: argument parsing, the interactive
//! confirmation prompt, the system clipboard and output rendering.

pub mod cli;
pub mod clipboard;
pub mod prompter;
pub mod render;

pub use clipboard::SystemClipboard;
pub use prompter::StdinPrompter;
