//! One action applied across an ordered set of repositories
//!
//! A [`PipelineRun`] walks its targets strictly one at a time, in dependency
//! order, or in reverse for destroy. The first failing repository aborts the
//! run: repositories before it stay applied, those after it are never touched.
//!
//! ```text
//! Pending ─▶ Running(0) ─▶ Running(1) ─▶ … ─▶ Completed
//!                 │             │
//!                 └─────────────┴──▶ Aborted(repo)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{DeckhandError, Result};
use crate::executor::ActionKind;

/// Result of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    Skipped,
}

/// Where a run is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(usize),
    Aborted { repo: String },
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => f.write_str("pending"),
            RunState::Running(index) => write!(f, "running target {}", index + 1),
            RunState::Aborted { repo } => write!(f, "aborted at {}", repo),
            RunState::Completed => f.write_str("completed"),
        }
    }
}

/// Ephemeral record of one action invocation
#[derive(Debug, Clone)]
pub struct PipelineRun {
    action: ActionKind,
    targets: Vec<String>,
    outcomes: BTreeMap<String, Outcome>,
    state: RunState,
}

impl PipelineRun {
    /// Create a run over `order`, a dependency order; destroy runs it backwards
    pub fn new(action: ActionKind, order: Vec<String>) -> Self {
        let mut targets = order;
        if action.is_reversed() {
            targets.reverse();
        }
        Self {
            action,
            targets,
            outcomes: BTreeMap::new(),
            state: RunState::Pending,
        }
    }

    /// Resume from `start`: repositories already handled before it are skipped
    ///
    /// "Before" is judged in dependency order. For a dependency order
    /// `[a, b, c]`, deploy from `b` runs `[b, c]` and destroy from `b` runs
    /// `[c, b]`, leaving `a` untouched in both cases.
    pub fn starting_from(mut self, start: &str) -> Result<Self> {
        let position = self.targets.iter().position(|t| t == start).ok_or_else(|| {
            DeckhandError::InstallationNotFound {
                name: start.to_string(),
            }
        })?;

        let kept: Vec<String> = if self.action.is_reversed() {
            self.targets.drain(..=position).collect()
        } else {
            self.targets.drain(position..).collect()
        };
        for skipped in self.targets.drain(..) {
            debug!(repo = %skipped, "Before starting point, skipping");
            self.outcomes.insert(skipped, Outcome::Skipped);
        }
        self.targets = kept;
        Ok(self)
    }

    /// Mark matching targets as skipped without running them
    pub fn skipping(mut self, skip: impl Fn(&str) -> bool) -> Self {
        let (skipped, kept): (Vec<String>, Vec<String>) =
            self.targets.into_iter().partition(|t| skip(t));
        for repo in skipped {
            self.outcomes.insert(repo, Outcome::Skipped);
        }
        self.targets = kept;
        self
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    /// Targets that will run, in execution order
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[cfg(test)]
    pub fn outcome(&self, repo: &str) -> Option<&Outcome> {
        self.outcomes.get(repo)
    }

    /// Index of the target currently running
    #[cfg(test)]
    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            RunState::Running(index) => Some(index),
            _ => None,
        }
    }

    /// Apply `apply` to each target in order, stopping at the first error
    ///
    /// The error is returned wrapped with the failing repository and action.
    pub fn execute<F>(&mut self, mut apply: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        if self.state != RunState::Pending {
            return Err(DeckhandError::ConfigInvalid {
                message: format!("{} run already {}", self.action, self.state),
            });
        }

        if self.targets.is_empty() {
            info!(action = %self.action, "Nothing to do");
        }

        for index in 0..self.targets.len() {
            self.state = RunState::Running(index);
            let repo = self.targets[index].clone();
            info!(repo = %repo, action = %self.action, "Starting");

            match apply(&repo) {
                Ok(()) => {
                    self.outcomes.insert(repo, Outcome::Succeeded);
                }
                Err(err) => {
                    warn!(repo = %repo, action = %self.action, "Aborting run: {}", err);
                    self.outcomes.insert(repo.clone(), Outcome::Failed);
                    self.state = RunState::Aborted { repo: repo.clone() };
                    return Err(err.in_repository(repo, self.action));
                }
            }
        }

        self.state = RunState::Completed;
        let skipped = self
            .outcomes
            .values()
            .filter(|o| **o == Outcome::Skipped)
            .count();
        info!(
            action = %self.action,
            applied = self.targets.len(),
            skipped = skipped,
            "Run completed"
        );
        Ok(())
    }
}
