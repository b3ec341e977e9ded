//! Tag components: streams of version/tag associations upserted to a catalog
//!
//! A tag file is a multi-document YAML stream, one [`VersionTags`] record per
//! document. Records are decoded one at a time and upserted as they come; the
//! first decode or upsert error aborts the push and the digest is not advanced,
//! so the next push replays the whole file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::component::{Publishers, Pushable};
use crate::config::{CATALOG_FILE, STATE_DIR, read_yaml, write_yaml};
use crate::error::{DeckhandError, Result};
use crate::hash;

/// What a set of tags points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform: Option<String>,

    pub version: String,
}

/// One record of a tag file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTags {
    pub spec: VersionSpec,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl VersionSpec {
    /// Catalog key: `chart[name:version]` or `terraform[name:version]`
    pub fn catalog_key(&self) -> Result<String> {
        match (&self.chart, &self.terraform) {
            (Some(chart), None) => Ok(format!("chart[{}:{}]", chart, self.version)),
            (None, Some(terraform)) => Ok(format!("terraform[{}:{}]", terraform, self.version)),
            _ => Err(DeckhandError::ConfigInvalid {
                message: format!(
                    "version {} must name exactly one of chart or terraform",
                    self.version
                ),
            }),
        }
    }
}

/// A file of version tag records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagComponent {
    key: String,
    path: PathBuf,
}

impl TagComponent {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    pub fn digest(&self) -> Result<String> {
        hash::digest(&[&self.path])
    }
}

impl Pushable for TagComponent {
    fn key(&self) -> &str {
        &self.key
    }

    fn push(&self, scope: &str, prior: &str, publishers: &mut Publishers<'_>) -> Result<String> {
        let digest = self.digest()?;
        if hash::verify_hash(prior, &digest) {
            return Ok(prior.to_string());
        }

        let file = File::open(&self.path).map_err(|e| DeckhandError::FileReadFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut count = 0usize;
        for document in serde_yaml::Deserializer::from_reader(BufReader::new(file)) {
            let record = Option::<VersionTags>::deserialize(document).map_err(|e| {
                DeckhandError::ConfigParseFailed {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            // Empty documents: an empty file or a trailing `---`
            let Some(record) = record else {
                continue;
            };
            publishers.catalog.upsert(scope, &record)?;
            count += 1;
        }

        info!(component = %self.key, records = count, "Pushed version tags");
        Ok(digest)
    }
}

/// Destination for version tag upserts
pub trait VersionCatalog {
    fn upsert(&mut self, scope: &str, record: &VersionTags) -> Result<()>;
}

/// Version catalog kept in `.deckhand/catalog.yaml`
///
/// ```yaml
/// <scope>:
///   chart[<name>:<version>]: [tag, ...]
/// ```
#[derive(Debug)]
pub struct LocalCatalog {
    path: PathBuf,
    entries: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl LocalCatalog {
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(STATE_DIR).join(CATALOG_FILE);
        let entries = if path.exists() {
            read_yaml(&path)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    #[cfg(test)]
    pub fn tags(&self, scope: &str, key: &str) -> Option<&[String]> {
        self.entries
            .get(scope)
            .and_then(|scoped| scoped.get(key))
            .map(Vec::as_slice)
    }
}

impl VersionCatalog for LocalCatalog {
    fn upsert(&mut self, scope: &str, record: &VersionTags) -> Result<()> {
        let key = record.spec.catalog_key()?;
        debug!(scope = %scope, key = %key, tags = ?record.tags, "Upserting version tags");
        self.entries
            .entry(scope.to_string())
            .or_default()
            .insert(key, record.tags.clone());
        write_yaml(&self.path, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::{CountingCatalog, CountingPublisher};
    use std::fs;
    use tempfile::TempDir;

    const TAGS: &str = r#"spec:
  chart: console
  version: 0.3.1
tags: [stable, latest]
---
spec:
  terraform: aws-bootstrap
  version: 1.2.0
tags: [stable]
"#;

    #[test]
    fn test_catalog_key() {
        let spec = VersionSpec {
            chart: Some("console".to_string()),
            terraform: None,
            version: "0.3.1".to_string(),
        };
        assert_eq!(spec.catalog_key().unwrap(), "chart[console:0.3.1]");

        let neither = VersionSpec {
            chart: None,
            terraform: None,
            version: "1.0.0".to_string(),
        };
        assert!(neither.catalog_key().is_err());
    }

    #[test]
    fn test_push_upserts_each_record_once() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tags.yaml");
        fs::write(&path, TAGS).unwrap();
        let component = TagComponent::new("tags.yaml", &path);
        let mut publisher = CountingPublisher::default();
        let mut catalog = CountingCatalog::default();
        let mut publishers = Publishers::new(&mut publisher, &mut catalog);

        let first = component.push("console", "", &mut publishers).unwrap();
        let second = component.push("console", &first, &mut publishers).unwrap();

        assert_eq!(first, second);
        assert_eq!(catalog.upserts, 2);
    }

    #[test]
    fn test_decode_error_aborts_push() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tags.yaml");
        fs::write(&path, format!("{}---\nspec: broken\n", TAGS)).unwrap();
        let component = TagComponent::new("tags.yaml", &path);
        let mut publisher = CountingPublisher::default();
        let mut catalog = CountingCatalog::default();
        let mut publishers = Publishers::new(&mut publisher, &mut catalog);

        let result = component.push("console", "blake3:prior", &mut publishers);

        assert!(result.is_err());
        assert_eq!(catalog.upserts, 2);
    }

    fn push_tags(content: &str) -> (Result<String>, usize) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tags.yaml");
        fs::write(&path, content).unwrap();
        let component = TagComponent::new("tags.yaml", &path);
        let mut publisher = CountingPublisher::default();
        let mut catalog = CountingCatalog::default();
        let mut publishers = Publishers::new(&mut publisher, &mut catalog);

        let result = component.push("console", "", &mut publishers);
        (result, catalog.upserts)
    }

    #[test]
    fn test_empty_tag_file_pushes_nothing() {
        let (result, upserts) = push_tags("");
        assert!(result.unwrap().starts_with(hash::HASH_PREFIX));
        assert_eq!(upserts, 0);
    }

    #[test]
    fn test_trailing_separator_is_ignored() {
        let (result, upserts) = push_tags(&format!("{}---
", TAGS));
        assert!(result.is_ok());
        assert_eq!(upserts, 2);
    }

    #[test]
    fn test_local_catalog_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tags.yaml");
        fs::write(&path, TAGS).unwrap();
        let component = TagComponent::new("tags.yaml", &path);

        let mut publisher = CountingPublisher::default();
        let mut catalog = LocalCatalog::open(temp.path()).unwrap();
        let mut publishers = Publishers::new(&mut publisher, &mut catalog);
        component.push("console", "", &mut publishers).unwrap();

        let reopened = LocalCatalog::open(temp.path()).unwrap();
        assert_eq!(
            reopened.tags("console", "terraform[aws-bootstrap:1.2.0]"),
            Some(&["stable".to_string()][..])
        );
    }

    #[test]
    fn test_local_catalog_rejects_ambiguous_spec() {
        let temp = TempDir::new().unwrap();
        let mut catalog = LocalCatalog::open(temp.path()).unwrap();
        let record = VersionTags {
            spec: VersionSpec {
                chart: None,
                terraform: None,
                version: "1.0.0".to_string(),
            },
            tags: vec!["stable".to_string()],
        };

        assert!(catalog.upsert("console", &record).is_err());
        assert!(catalog.tags("console", "chart[:1.0.0]").is_none());
    }
}
