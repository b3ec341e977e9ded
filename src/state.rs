//! Persisted digests of the last successful push of each component and step
//!
//! A digest only advances after the work it guards succeeded. On failure the
//! previous digest stays in place, so the next run retries the same work.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{DIGESTS_FILE, STATE_DIR, read_yaml, write_yaml};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    components: BTreeMap<String, String>,
    #[serde(default)]
    steps: BTreeMap<String, String>,
}

/// `(key, digest)` pairs stored in `.deckhand/digests.yaml`
#[derive(Debug, Clone)]
pub struct DigestLedger {
    path: PathBuf,
    file: LedgerFile,
}

impl DigestLedger {
    /// Open the ledger of a workspace root; a missing file is an empty ledger
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(STATE_DIR).join(DIGESTS_FILE);
        let file = if path.exists() {
            read_yaml(&path)?
        } else {
            LedgerFile::default()
        };
        Ok(Self { path, file })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last pushed digest of a component, empty when never pushed
    pub fn component(&self, key: &str) -> &str {
        self.file
            .components
            .get(key)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Record a component digest and persist the ledger
    pub fn record_component(&mut self, key: &str, digest: &str) -> Result<()> {
        self.file
            .components
            .insert(key.to_string(), digest.to_string());
        self.save()
    }

    /// Last applied digest of a step target, empty when never applied
    pub fn step(&self, key: &str) -> &str {
        self.file
            .steps
            .get(key)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Record a step digest and persist the ledger
    pub fn record_step(&mut self, key: &str, digest: &str) -> Result<()> {
        self.file.steps.insert(key.to_string(), digest.to_string());
        self.save()
    }

    /// Forget every step digest recorded for a repository
    pub fn forget_repository(&mut self, repo: &str) -> Result<()> {
        let prefix = format!("{}/", repo);
        let before = self.file.steps.len();
        self.file.steps.retain(|key, _| !key.starts_with(&prefix));
        if self.file.steps.len() != before {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        write_yaml(&self.path, &self.file)
    }
}

/// Ledger key of a step
pub fn step_key(repo: &str, action: &str, step: &str) -> String {
    format!("{}/{}/{}", repo, action, step)
}
