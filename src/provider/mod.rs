//! Cloud provider capabilities
//!
//! A provider knows where a workspace's state lives and how to reach its
//! cluster. Repositories consume it through [`Provider`]; only local kind
//! clusters ship with this crate ([`kind::KindProvider`]).

pub mod kind;

use std::path::Path;

use crate::config::{ProjectManifest, RepoConfig};
use crate::error::{DeckhandError, Result};
use crate::executor::StepRunner;

pub use kind::KindProvider;

/// Values a backend configuration is rendered from, besides the provider's own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendContext {
    pub region: Option<String>,
    pub bucket: Option<String>,
    /// Existing cluster to attach to instead of the provider's cluster
    pub cluster: Option<String>,
    pub cluster_created: bool,
}

impl BackendContext {
    /// Per-repository overrides from `context.yaml`
    pub fn from_config(config: Option<&RepoConfig>) -> Self {
        match config {
            Some(config) => Self {
                region: config.region.clone(),
                bucket: config.bucket.clone(),
                cluster: config.cluster.clone(),
                cluster_created: config.cluster_created(),
            },
            None => Self::default(),
        }
    }
}

/// What the pipeline needs from a cloud provider
pub trait Provider {
    fn name(&self) -> &str;
    fn cluster(&self) -> &str;
    fn region(&self) -> &str;
    fn bucket(&self) -> &str;

    /// Render the terraform backend configuration for state under `prefix`
    fn create_backend(&self, prefix: &str, ctx: &BackendContext) -> Result<String>;

    /// Make the cluster reachable for kubectl and helm
    fn kube_config(&self, runner: &mut dyn StepRunner) -> Result<()>;

    /// Remove a node from the provider before it is deleted from the cluster
    fn decommission(&self, node: &str) -> Result<()>;

    /// Check that the provider's settings are present and consistent
    fn validate(&self) -> Result<()>;
}

/// Build the provider named in the project manifest
pub fn from_manifest(manifest: &ProjectManifest, root: &Path) -> Result<Box<dyn Provider>> {
    match manifest.provider.as_str() {
        kind::KIND => Ok(Box::new(KindProvider::from_manifest(manifest, root))),
        "" => Err(DeckhandError::ConfigMissing {
            setting: "provider (deckhand.yaml)".to_string(),
        }),
        other => Err(DeckhandError::ProviderNotSupported {
            provider: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(provider: &str) -> ProjectManifest {
        ProjectManifest {
            cluster: "dev".to_string(),
            provider: provider.to_string(),
            region: "us-east-1".to_string(),
            bucket: "state".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_manifest_kind() {
        let temp = TempDir::new().unwrap();
        let provider = from_manifest(&manifest("kind"), temp.path()).unwrap();
        assert_eq!(provider.name(), "kind");
        assert_eq!(provider.cluster(), "dev");
    }

    #[test]
    fn test_from_manifest_unsupported() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            from_manifest(&manifest("equinix"), temp.path()),
            Err(DeckhandError::ProviderNotSupported { .. })
        ));
    }

    #[test]
    fn test_from_manifest_missing_provider() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            from_manifest(&manifest(""), temp.path()),
            Err(DeckhandError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn test_backend_context_from_config() {
        let config = RepoConfig {
            cluster: Some("module.cluster.name".to_string()),
            ..Default::default()
        };
        let ctx = BackendContext::from_config(Some(&config));
        assert!(ctx.cluster_created);
        assert_eq!(BackendContext::from_config(None), BackendContext::default());
    }
}
