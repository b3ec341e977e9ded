//! Per-repository configuration (context.yaml)

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CONTEXT_FILE, read_yaml};
use crate::error::Result;
use crate::template::TemplateVars;

/// Configuration values for every repository, keyed by repository name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub configuration: BTreeMap<String, RepoConfig>,
}

/// Recognized settings for one repository plus an open extension map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Name of a cluster this repository attaches to instead of creating one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_created: Option<bool>,

    /// Provider- or chart-specific values
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Context {
    /// Load the context, falling back to an empty one when the file is absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONTEXT_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "No context file, using empty context");
            return Ok(Self::default());
        }
        read_yaml(&path)
    }

    /// Configuration for one repository
    pub fn repo_config(&self, repo: &str) -> Option<&RepoConfig> {
        self.configuration.get(repo)
    }
}

impl RepoConfig {
    /// Whether the repository attaches to an existing cluster
    pub fn cluster_created(&self) -> bool {
        self.cluster_created.unwrap_or(self.cluster.is_some())
    }

    /// Values exposed to scaffold templates, under the `config.` prefix
    pub fn template_vars(&self) -> TemplateVars {
        let mut vars = TemplateVars::new();

        let known = [
            ("region", self.region.as_ref()),
            ("bucket", self.bucket.as_ref()),
            ("cluster", self.cluster.as_ref()),
        ];
        for (key, value) in known {
            if let Some(value) = value {
                vars.insert(format!("config.{}", key), value.clone());
            }
        }
        vars.insert(
            "config.clusterCreated".to_string(),
            self.cluster_created().to_string(),
        );

        for (key, value) in &self.extra {
            match scalar_to_string(value) {
                Some(rendered) => {
                    vars.insert(format!("config.{}", key), rendered);
                }
                None => debug!(key = %key, "Skipping non-scalar configuration value"),
            }
        }

        vars
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTEXT_YAML: &str = r#"
configuration:
  console:
    region: eu-west-1
    hostname: console.example.com
    replicas: 2
    resources:
      cpu: 100m
  bootstrap:
    cluster: shared
"#;

    #[test]
    fn test_load_missing_context_is_empty() {
        let temp = TempDir::new().unwrap();
        let context = Context::load(temp.path()).unwrap();
        assert!(context.configuration.is_empty());
    }

    #[test]
    fn test_parse_known_and_extra_keys() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONTEXT_FILE), CONTEXT_YAML).unwrap();

        let context = Context::load(temp.path()).unwrap();
        let console = context.repo_config("console").unwrap();
        assert_eq!(console.region.as_deref(), Some("eu-west-1"));
        assert!(console.extra.contains_key("hostname"));
        assert!(!console.cluster_created());

        let bootstrap = context.repo_config("bootstrap").unwrap();
        assert!(bootstrap.cluster_created());
    }

    #[test]
    fn test_template_vars_only_include_scalars() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONTEXT_FILE), CONTEXT_YAML).unwrap();

        let context = Context::load(temp.path()).unwrap();
        let vars = context.repo_config("console").unwrap().template_vars();

        assert_eq!(
            vars.get("config.hostname").map(String::as_str),
            Some("console.example.com")
        );
        assert_eq!(vars.get("config.replicas").map(String::as_str), Some("2"));
        assert!(!vars.contains_key("config.resources"));
    }
}
