//! Artifact components: a metadata file plus the readme and blob it names

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::component::{Publishers, Pushable};
use crate::error::{DeckhandError, Result};
use crate::executor::{Step, StepRunner};
use crate::hash;

/// Metadata file of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub readme: String,
    pub blob: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// A publishable artifact backed by its metadata file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactComponent {
    key: String,
    path: PathBuf,
}

impl ArtifactComponent {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    pub fn metadata(&self) -> Result<ArtifactMetadata> {
        let content = fs::read_to_string(&self.path).map_err(|e| DeckhandError::DigestFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| DeckhandError::ConfigParseFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Digest over the metadata file, its readme and its blob, in that order
    pub fn digest(&self) -> Result<String> {
        let metadata = self.metadata()?;
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        hash::digest(&[
            self.path.clone(),
            base.join(&metadata.readme),
            base.join(&metadata.blob),
        ])
    }
}

impl Pushable for ArtifactComponent {
    fn key(&self) -> &str {
        &self.key
    }

    fn push(&self, scope: &str, prior: &str, publishers: &mut Publishers<'_>) -> Result<String> {
        let digest = self.digest()?;
        if hash::verify_hash(prior, &digest) {
            return Ok(prior.to_string());
        }

        let metadata = self.metadata()?;
        publishers.artifacts.publish(scope, &self.path, &metadata)?;
        info!(component = %self.key, artifact = %metadata.name, "Pushed artifact");
        Ok(digest)
    }
}

/// Destination for artifact pushes
pub trait ArtifactPublisher {
    fn publish(&mut self, scope: &str, file: &Path, metadata: &ArtifactMetadata) -> Result<()>;
}

/// Publishes by running `<program> push artifact <file> <scope>`
pub struct CommandPublisher<R> {
    program: String,
    runner: R,
}

impl<R: StepRunner> CommandPublisher<R> {
    pub fn new(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

impl<R: StepRunner> ArtifactPublisher for CommandPublisher<R> {
    fn publish(&mut self, scope: &str, file: &Path, metadata: &ArtifactMetadata) -> Result<()> {
        let wkdir = file.parent().unwrap_or_else(|| Path::new("."));
        let file = file.display().to_string();
        let step = Step::new(
            format!("push-{}", metadata.name),
            wkdir,
            self.program.as_str(),
            &["push", "artifact", file.as_str(), scope],
        );
        self.runner.run(&step).map(|_| ())
    }
}
