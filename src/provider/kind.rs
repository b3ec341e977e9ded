//! Local kind clusters
//!
//! State is kept in the workspace itself under `<bucket>/<prefix>`, so the
//! backend is terraform's local backend.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BackendContext, Provider};
use crate::config::ProjectManifest;
use crate::error::{DeckhandError, Result};
use crate::executor::{Step, StepRunner};
use crate::template::{self, TemplateVars};

pub const KIND: &str = "kind";

const DEFAULT_REGION: &str = "us-east-1";

const BACKEND_TEMPLATE: &str = r#"terraform {
  backend "local" {
    path = "../../{{ bucket }}/{{ prefix }}/terraform.tfstate"
  }
}

locals {
  cluster_name    = {{ cluster }}
  cluster_created = {{ cluster_created }}
  region          = "{{ region }}"
}
"#;

const BUCKET_GITIGNORE: &str = "!/**";
const BUCKET_GITATTRIBUTES: &str = "/** filter=deckhand-crypt diff=deckhand-crypt\n.gitattributes !filter !diff";

/// Set inside a pod; kubeconfig is then provided by the service account
const IN_CLUSTER_ENV: &str = "KUBERNETES_SERVICE_HOST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProvider {
    root: PathBuf,
    cluster: String,
    region: String,
    bucket: String,
}

impl KindProvider {
    pub fn from_manifest(manifest: &ProjectManifest, root: &Path) -> Self {
        let region = if manifest.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            manifest.region.clone()
        };
        Self {
            root: root.to_path_buf(),
            cluster: manifest.cluster.clone(),
            region,
            bucket: manifest.bucket.clone(),
        }
    }

    fn write_bucket_files(&self, bucket: &str) -> Result<()> {
        let dir = self.root.join(bucket);
        fs::create_dir_all(&dir).map_err(|e| DeckhandError::FileWriteFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        for (name, content) in [
            (".gitignore", BUCKET_GITIGNORE),
            (".gitattributes", BUCKET_GITATTRIBUTES),
        ] {
            let path = dir.join(name);
            fs::write(&path, content).map_err(|e| DeckhandError::FileWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn in_kubernetes() -> bool {
    std::env::var_os(IN_CLUSTER_ENV).is_some()
}

impl Provider for KindProvider {
    fn name(&self) -> &str {
        KIND
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn create_backend(&self, prefix: &str, ctx: &BackendContext) -> Result<String> {
        let bucket = ctx.bucket.as_deref().unwrap_or(&self.bucket);
        let region = ctx.region.as_deref().unwrap_or(&self.region);

        // An attached cluster is a terraform expression, our own is a literal name
        let cluster = match &ctx.cluster {
            Some(expression) if ctx.cluster_created => expression.clone(),
            _ => format!("\"{}\"", self.cluster),
        };

        self.write_bucket_files(bucket)?;

        let vars: TemplateVars = [
            ("bucket", bucket.to_string()),
            ("prefix", prefix.to_string()),
            ("region", region.to_string()),
            ("cluster", cluster),
            ("cluster_created", ctx.cluster_created.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        template::render("kind backend", BACKEND_TEMPLATE, &vars)
    }

    fn kube_config(&self, runner: &mut dyn StepRunner) -> Result<()> {
        if in_kubernetes() {
            debug!("Running inside kubernetes, using in-cluster config");
            return Ok(());
        }
        let step = Step::new(
            "kind-kubeconfig",
            &self.root,
            "kind",
            &["export", "kubeconfig", "--name", self.cluster.as_str()],
        );
        runner.run(&step).map(|_| ())
    }

    fn decommission(&self, node: &str) -> Result<()> {
        debug!(node = %node, "Nothing to decommission for kind nodes");
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cluster.trim().is_empty() {
            return Err(DeckhandError::ConfigMissing {
                setting: "cluster (deckhand.yaml)".to_string(),
            });
        }
        if self.bucket.trim().is_empty() {
            return Err(DeckhandError::ConfigMissing {
                setting: "bucket (deckhand.yaml)".to_string(),
            });
        }
        Ok(())
    }
}
