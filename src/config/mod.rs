//! Configuration file handling for Deckhand
//!
//! This module handles:
//! - `deckhand.yaml`: project manifest (provider, cluster, region, bucket)
//! - `context.yaml`: per-repository configuration values
//! - `installations.yaml`: installed repositories and their dependencies
//!
//! ## Workspace Structure
//!
//! ```text
//! <root>/
//! ├── deckhand.yaml         # Project manifest
//! ├── context.yaml          # Per-repository configuration
//! ├── installations.yaml    # Installed repositories
//! ├── .deckhand/
//! │   ├── digests.yaml      # Last pushed digests
//! │   └── catalog.yaml      # Local version catalog
//! └── <repo>/
//!     ├── deploy.yaml       # Optional step definitions
//!     ├── templates/        # Scaffold templates (*.tpl)
//!     ├── terraform/
//!     └── helm/<repo>/
//! ```

pub mod context;
pub mod installations;
pub mod manifest;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DeckhandError, Result};

pub use context::{Context, RepoConfig};
pub use installations::{Installation, Installations, Repository};
pub use manifest::ProjectManifest;

/// Project manifest filename
pub const MANIFEST_FILE: &str = "deckhand.yaml";

/// Context filename
pub const CONTEXT_FILE: &str = "context.yaml";

/// Installations filename
pub const INSTALLATIONS_FILE: &str = "installations.yaml";

/// State directory holding digests and the local catalog
pub const STATE_DIR: &str = ".deckhand";

/// Persisted digests filename (inside [`STATE_DIR`])
pub const DIGESTS_FILE: &str = "digests.yaml";

/// Local version catalog filename (inside [`STATE_DIR`])
pub const CATALOG_FILE: &str = "catalog.yaml";

/// Read and parse a YAML file
pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(DeckhandError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| DeckhandError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| DeckhandError::ConfigParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Serialize a value to YAML and write it, creating parent directories
pub(crate) fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DeckhandError::FileWriteFailed {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    fs::write(path, content).map_err(|e| DeckhandError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
