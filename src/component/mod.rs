//! Pushable components and their incremental publishing
//!
//! A component is a file whose content is published somewhere: an artifact
//! blob or a set of version tags. Every push first compares the component's
//! current digest with the last pushed one and does nothing when they match.
//!
//! `components.yaml` lists the components of a publishing repository:
//!
//! ```yaml
//! scope: console
//! components:
//!   - artifact: artifacts/cli.yaml
//!   - tags: tags.yaml
//! ```

pub mod artifact;
pub mod tags;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::read_yaml;
use crate::error::{DeckhandError, Result};
use crate::state::DigestLedger;

pub use artifact::{ArtifactComponent, ArtifactPublisher, CommandPublisher};
pub use tags::{LocalCatalog, TagComponent, VersionCatalog};

/// Default component list filename
pub const COMPONENTS_FILE: &str = "components.yaml";

/// Side-effect collaborators of a push
pub struct Publishers<'a> {
    pub artifacts: &'a mut dyn ArtifactPublisher,
    pub catalog: &'a mut dyn VersionCatalog,
}

impl<'a> Publishers<'a> {
    pub fn new(artifacts: &'a mut dyn ArtifactPublisher, catalog: &'a mut dyn VersionCatalog) -> Self {
        Self { artifacts, catalog }
    }
}

/// Something whose content can be published incrementally
pub trait Pushable {
    /// Stable identity, the backing file path
    fn key(&self) -> &str;

    /// Publish when the current digest differs from `prior`
    ///
    /// Returns the digest to persist: `prior` itself when nothing changed, the
    /// new digest after a successful publish. A digest that cannot be computed
    /// is an error, never a change.
    fn push(&self, scope: &str, prior: &str, publishers: &mut Publishers<'_>) -> Result<String>;
}

/// Known component kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Artifact(ArtifactComponent),
    Tags(TagComponent),
}

impl Pushable for Component {
    fn key(&self) -> &str {
        match self {
            Component::Artifact(artifact) => artifact.key(),
            Component::Tags(tags) => tags.key(),
        }
    }

    fn push(&self, scope: &str, prior: &str, publishers: &mut Publishers<'_>) -> Result<String> {
        match self {
            Component::Artifact(artifact) => artifact.push(scope, prior, publishers),
            Component::Tags(tags) => tags.push(scope, prior, publishers),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ComponentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ComponentsFile {
    scope: String,

    #[serde(default)]
    components: Vec<ComponentEntry>,
}

/// Components of one publishing scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSet {
    pub scope: String,
    pub components: Vec<Component>,
}

impl ComponentSet {
    /// Load a `components.yaml`; component keys are relative to `root`
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let file: ComponentsFile = read_yaml(path)?;
        if file.scope.trim().is_empty() {
            return Err(DeckhandError::ConfigMissing {
                setting: format!("scope ({})", path.display()),
            });
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let key_of = |p: &PathBuf| {
            p.strip_prefix(root)
                .unwrap_or(p)
                .to_string_lossy()
                .replace('\\', "/")
        };

        let mut components = Vec::with_capacity(file.components.len());
        for entry in file.components {
            let component = match (entry.artifact, entry.tags) {
                (Some(artifact), None) => {
                    let p = base.join(artifact);
                    Component::Artifact(ArtifactComponent::new(key_of(&p), p))
                }
                (None, Some(tags)) => {
                    let p = base.join(tags);
                    Component::Tags(TagComponent::new(key_of(&p), p))
                }
                _ => {
                    return Err(DeckhandError::ConfigInvalid {
                        message: format!(
                            "{}: each component must name exactly one of artifact or tags",
                            path.display()
                        ),
                    });
                }
            };
            components.push(component);
        }

        Ok(Self {
            scope: file.scope,
            components,
        })
    }
}

/// Outcome of pushing a set of components
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub pushed: Vec<String>,
    pub unchanged: Vec<String>,
}

/// Push every component in order, recording each new digest as soon as it lands
///
/// Stops at the first failing component. Digests of components pushed before
/// the failure are already saved; the failing one keeps its prior digest.
pub fn push_all(
    ledger: &mut DigestLedger,
    scope: &str,
    components: &[Component],
    publishers: &mut Publishers<'_>,
) -> Result<PushSummary> {
    let mut summary = PushSummary::default();

    for component in components {
        let key = component.key();
        let prior = ledger.component(key).to_string();
        let digest = component.push(scope, &prior, publishers)?;

        if digest == prior {
            debug!(component = %key, "Unchanged, nothing to push");
            summary.unchanged.push(key.to_string());
        } else {
            ledger.record_component(key, &digest)?;
            info!(component = %key, digest = %digest, "Recorded digest");
            summary.pushed.push(key.to_string());
        }
    }

    Ok(summary)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::component::artifact::ArtifactMetadata;
    use crate::component::tags::VersionTags;

    /// Counts artifact publishes
    #[derive(Debug, Default)]
    pub struct CountingPublisher {
        pub published: Vec<(String, String)>,
        pub fail: bool,
    }

    impl ArtifactPublisher for CountingPublisher {
        fn publish(&mut self, scope: &str, _file: &Path, metadata: &ArtifactMetadata) -> Result<()> {
            if self.fail {
                return Err(DeckhandError::StepFailed {
                    step: format!("push-{}", metadata.name),
                    command: "push artifact".to_string(),
                    output: "registry unavailable".to_string(),
                });
            }
            self.published
                .push((scope.to_string(), metadata.name.clone()));
            Ok(())
        }
    }

    /// Counts catalog upserts
    #[derive(Debug, Default)]
    pub struct CountingCatalog {
        pub upserts: usize,
    }

    impl VersionCatalog for CountingCatalog {
        fn upsert(&mut self, _scope: &str, record: &VersionTags) -> Result<()> {
            record.spec.catalog_key()?;
            self.upserts += 1;
            Ok(())
        }
    }
}
