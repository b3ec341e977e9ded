//! Per-run operator interaction
//!
//! A [`Session`] lives for one command invocation. It remembers whether the
//! operator already confirmed, so a run over many repositories asks once.

use inquire::{Confirm, Text};

use crate::error::{DeckhandError, Result};

#[derive(Debug, Clone, Default)]
pub struct Session {
    confirmed: bool,
    assume_yes: bool,
    interactive: bool,
}

impl Session {
    pub fn new(interactive: bool) -> Self {
        Self {
            confirmed: false,
            assume_yes: false,
            interactive,
        }
    }

    /// Answer yes to every confirmation without prompting
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Ask `message` unless the operator already agreed during this run
    ///
    /// Without a terminal and without `--yes` the answer is no.
    pub fn confirm(&mut self, message: &str) -> Result<bool> {
        if self.confirmed || self.assume_yes {
            return Ok(true);
        }
        if !self.interactive {
            return Ok(false);
        }

        let answer = Confirm::new(message)
            .with_default(false)
            .with_help_message("Type 'y' to continue")
            .prompt()
            .map_err(|e| DeckhandError::IoError {
                message: format!("Failed to read confirmation: {e}"),
            })?;
        self.confirmed = answer;
        Ok(answer)
    }

    /// Prompt for a commit message; empty means do not commit
    pub fn commit_message(&self) -> Result<String> {
        if !self.interactive {
            return Ok(String::new());
        }
        let message = Text::new("Enter a commit message (empty to not commit right now)").prompt()?;
        Ok(message.trim().to_string())
    }
}
