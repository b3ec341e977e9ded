//! Steps: external commands run in a working directory
//!
//! Every external tool invocation (terraform, helm, kubectl, git, kind) is a
//! [`Step`] value handed to a [`StepRunner`]. The shipped runner spawns a
//! process; tests substitute recording doubles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeckhandError, Result};

/// One unit of external work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub wkdir: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    /// Path whose digest gates re-running the step, if incremental
    pub target: Option<PathBuf>,
}

/// Step as written in a repository's `deploy.yaml`, paths relative to the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,

    #[serde(default = "default_wkdir")]
    pub wkdir: String,

    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

fn default_wkdir() -> String {
    ".".to_string()
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        wkdir: impl Into<PathBuf>,
        command: impl Into<String>,
        args: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            wkdir: wkdir.into(),
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// The command line as an operator would type it
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.command_line())
    }
}

impl StepSpec {
    /// Anchor relative paths at a repository directory
    pub fn into_step(self, repo_dir: &Path) -> Step {
        Step {
            wkdir: repo_dir.join(&self.wkdir),
            target: self.target.map(|t| repo_dir.join(t)),
            name: self.name,
            command: self.command,
            args: self.args,
        }
    }
}

/// Executes steps
pub trait StepRunner {
    /// Run a step to completion, returning its combined output
    ///
    /// A step that cannot be spawned or exits unsuccessfully fails with
    /// [`DeckhandError::StepFailed`].
    fn run(&mut self, step: &Step) -> Result<String>;
}

/// Runs steps as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl StepRunner for ProcessRunner {
    fn run(&mut self, step: &Step) -> Result<String> {
        debug!(step = %step.name, wkdir = %step.wkdir.display(), "Running {}", step.command_line());

        let output = Command::new(&step.command)
            .args(&step.args)
            .current_dir(&step.wkdir)
            .output()
            .map_err(|e| DeckhandError::StepFailed {
                step: step.name.clone(),
                command: step.command_line(),
                output: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(DeckhandError::StepFailed {
                step: step.name.clone(),
                command: step.command_line(),
                output: combined,
            });
        }

        Ok(combined)
    }
}
