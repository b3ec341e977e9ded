//! Installed repositories (installations.yaml)
//!
//! Installation records are produced by the bundle/recipe flow; this crate
//! only reads them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{INSTALLATIONS_FILE, read_yaml};
use crate::error::{DeckhandError, Result};

/// A named infrastructure unit and the repositories it depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    /// `None` when the dependency metadata is unknown, as opposed to empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OIDC trust provider attached to an installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcProvider {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// A repository bound to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub repository: Repository,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_provider: Option<OidcProvider>,
}

/// All installations of a workspace, in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installations {
    #[serde(default)]
    pub installations: Vec<Installation>,
}

impl Repository {
    /// Create a repository with known dependencies
    pub fn new(name: impl Into<String>, dependencies: &[&str]) -> Self {
        Self {
            name: name.into(),
            dependencies: Some(dependencies.iter().map(|d| d.to_string()).collect()),
            description: None,
        }
    }
}

impl Installation {
    pub fn name(&self) -> &str {
        &self.repository.name
    }
}

impl From<Repository> for Installation {
    fn from(repository: Repository) -> Self {
        Self {
            repository,
            account: None,
            oidc_provider: None,
        }
    }
}

impl Installations {
    /// Load installations from a workspace root
    pub fn load(root: &Path) -> Result<Self> {
        read_yaml(&root.join(INSTALLATIONS_FILE))
    }

    #[cfg(test)]
    pub fn save(&self, root: &Path) -> Result<()> {
        super::write_yaml(&root.join(INSTALLATIONS_FILE), self)
    }

    /// Load installations, failing when none are recorded
    pub fn load_non_empty(root: &Path) -> Result<Self> {
        let installations = Self::load(root)?;
        if installations.installations.is_empty() {
            return Err(DeckhandError::NoInstallations);
        }
        Ok(installations)
    }

    /// Find an installation by repository name
    pub fn find(&self, name: &str) -> Option<&Installation> {
        self.installations.iter().find(|i| i.name() == name)
    }

    /// Find an installation by repository name, failing when absent
    pub fn get(&self, name: &str) -> Result<&Installation> {
        self.find(name)
            .ok_or_else(|| DeckhandError::InstallationNotFound {
                name: name.to_string(),
            })
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<String> {
        self.installations
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_installations() {
        let yaml = r#"
installations:
  - repository:
      name: console
      dependencies: []
    oidc_provider:
      client_id: abc
      redirect_uris: ["https://console.example.com/oauth/callback"]
  - repository:
      name: bootstrap
      dependencies: [console]
  - repository:
      name: monitoring
"#;
        let installations: Installations = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(installations.names(), vec!["console", "bootstrap", "monitoring"]);
        assert_eq!(
            installations.get("bootstrap").unwrap().repository.dependencies,
            Some(vec!["console".to_string()])
        );
        assert!(installations.get("monitoring").unwrap().repository.dependencies.is_none());
        assert!(installations.get("console").unwrap().oidc_provider.is_some());
    }

    #[test]
    fn test_get_missing_installation() {
        let installations = Installations::default();
        assert!(matches!(
            installations.get("console"),
            Err(DeckhandError::InstallationNotFound { .. })
        ));
    }

    #[test]
    fn test_load_non_empty_rejects_empty_file() {
        let temp = TempDir::new().unwrap();
        Installations::default().save(temp.path()).unwrap();

        assert!(matches!(
            Installations::load_non_empty(temp.path()),
            Err(DeckhandError::NoInstallations)
        ));
    }
}
