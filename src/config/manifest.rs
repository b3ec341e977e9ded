//! Project manifest (deckhand.yaml)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{MANIFEST_FILE, read_yaml};
use crate::error::{DeckhandError, Result};
use crate::template::TemplateVars;

/// Project-wide settings shared by every repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectManifest {
    pub cluster: String,
    pub project: String,
    pub provider: String,
    pub region: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
}

/// Owner of the workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub email: String,
}

impl ProjectManifest {
    /// Load the manifest from a workspace root
    pub fn load(root: &Path) -> Result<Self> {
        read_yaml(&root.join(MANIFEST_FILE))
    }

    #[cfg(test)]
    pub fn save(&self, root: &Path) -> Result<()> {
        super::write_yaml(&root.join(MANIFEST_FILE), self)
    }

    /// Check that every required setting is present
    ///
    /// Reports the first missing setting by name.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("cluster", &self.cluster),
            ("provider", &self.provider),
            ("region", &self.region),
            ("bucket", &self.bucket),
        ];

        for (setting, value) in required {
            if value.trim().is_empty() {
                return Err(DeckhandError::ConfigMissing {
                    setting: format!("{} ({})", setting, MANIFEST_FILE),
                });
            }
        }

        Ok(())
    }

    /// Values exposed to scaffold templates
    pub fn template_vars(&self) -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.insert("cluster".to_string(), self.cluster.clone());
        vars.insert("project".to_string(), self.project.clone());
        vars.insert("provider".to_string(), self.provider.clone());
        vars.insert("region".to_string(), self.region.clone());
        vars.insert("bucket".to_string(), self.bucket.clone());
        vars.insert(
            "bucket_prefix".to_string(),
            self.bucket_prefix.clone().unwrap_or_default(),
        );
        if let Some(owner) = &self.owner {
            vars.insert("owner.email".to_string(), owner.email.clone());
        }
        vars
    }
}
