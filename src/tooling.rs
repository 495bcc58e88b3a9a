//! Tooling & Integration Layer
//!
//! Command-line front end, terminal prompts and output formatting.

pub mod cli;
pub mod format;
pub mod prompt;

pub use cli::{Cli, CliContext, Commands};
pub use prompt::DialoguerPrompt;
