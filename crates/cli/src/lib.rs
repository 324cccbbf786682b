//! Library interface for the drhp CLI
//!
//! Rendering lives here so it can be tested without a terminal; the binary in
//! main.rs only wires arguments, configuration and the prompt loop together.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod render;

pub use render::{preview_text, TerminalRenderer};

/// Inputs that end an interactive session
pub const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// True when the line asks to leave the interactive loop
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|cmd| trimmed.eq_ignore_ascii_case(cmd))
}
