//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::error::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_partial_release, display_plan, display_status, display_step,
    display_success, display_warning,
};

/// Prompts user to confirm an action with a yes/no prompt on stdin.
///
/// Accepts "y" or "yes" (case-insensitive); anything else, including
/// an empty line, is a "no".
pub fn confirm_action(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_action_from(prompt, &mut stdin.lock(), &mut io::stdout())
}

/// [`confirm_action`] against arbitrary input and output streams.
pub fn confirm_action_from<I: BufRead, O: Write>(
    prompt: &str,
    input: &mut I,
    output: &mut O,
) -> Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
