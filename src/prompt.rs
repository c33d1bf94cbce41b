//! User prompts

use inquire::{Confirm, Text};

use crate::error::{LauncherError, Result};

pub trait Prompter {
    /// Yes/no question. A cancelled prompt is an error, not a "no".
    fn confirm(&self, message: &str) -> Result<bool>;

    /// One line of free text (menu selections).
    fn read_line(&self, message: &str) -> Result<String>;
}

/// Interactive terminal prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter {
    /// Answer every confirmation with yes (`--yes`).
    pub assume_yes: bool,
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        if self.assume_yes {
            log::info!("Auto-confirming: {message}");
            return Ok(true);
        }
        Confirm::new(message)
            .with_default(false)
            .prompt()
            .map_err(|e| LauncherError::Prompt(e.to_string()))
    }

    fn read_line(&self, message: &str) -> Result<String> {
        Text::new(message)
            .prompt()
            .map_err(|e| LauncherError::Prompt(e.to_string()))
    }
}
