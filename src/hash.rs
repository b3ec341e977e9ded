//! BLAKE3 content digests for change detection
//!
//! Digests depend only on file contents (never mtime or inode), so a digest
//! recorded after a successful push stays valid until the bytes change.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::{DeckhandError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Separator between per-path hashes in a composite digest
const COMPOSITE_SEPARATOR: &str = ":";

/// Stream a file's bytes into `hasher`
fn update_from_file(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let read_failed = |e: std::io::Error| DeckhandError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut reader = BufReader::new(File::open(path).map_err(read_failed)?);
    io::copy(&mut reader, hasher).map_err(read_failed)?;
    Ok(())
}

/// Calculate BLAKE3 hash of a file
pub fn hash_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    update_from_file(&mut hasher, path)?;
    Ok(format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()))
}

/// Tool state written next to sources (`.terraform/`, `.git/`) is not content
fn is_tool_state_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

/// Calculate BLAKE3 hash of a directory's contents
///
/// Hashes all files recursively, sorted by relative path for deterministic
/// results. The relative path of each file is part of the hash, so renames
/// change the digest. Hidden directories are skipped.
pub fn hash_directory(path: &Path) -> Result<String> {
    if !path.is_dir() {
        return Err(DeckhandError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut hasher = Hasher::new();
    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_tool_state_dir(e));
    for entry in walker {
        let entry = entry.map_err(|e| DeckhandError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();

    for file_path in files {
        let relative_path = file_path
            .strip_prefix(path)
            .unwrap_or(&file_path)
            .to_string_lossy()
            .replace('\\', "/");
        hasher.update(relative_path.as_bytes());
        hasher.update(b"\0");

        update_from_file(&mut hasher, &file_path)?;

        hasher.update(b"\0");
    }

    Ok(format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()))
}

/// Hash a single path, which may be a file or a directory
pub fn hash_path(path: &Path) -> Result<String> {
    if path.is_dir() {
        hash_directory(path)
    } else {
        hash_file(path)
    }
}

/// Compute an order-sensitive digest over one or more paths
///
/// Each path is hashed on its own, then the `:`-joined per-path hashes are
/// hashed again. Swapping two paths yields a different digest. A missing or
/// unreadable path fails with [`DeckhandError::DigestFailed`].
pub fn digest<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    if paths.is_empty() {
        return Err(DeckhandError::DigestFailed {
            path: String::new(),
            reason: "no paths given".to_string(),
        });
    }

    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let part = hash_path(path).map_err(|e| DeckhandError::DigestFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        parts.push(part);
    }

    let composite = parts.join(COMPOSITE_SEPARATOR);
    Ok(format!(
        "{}{}",
        HASH_PREFIX,
        blake3::hash(composite.as_bytes()).to_hex()
    ))
}

/// Verify a hash matches the expected value
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    let normalize = |h: &str| {
        if h.starts_with(HASH_PREFIX) {
            h.to_string()
        } else {
            format!("{}{}", HASH_PREFIX, h)
        }
    };

    !expected.is_empty() && normalize(expected) == normalize(actual)
}
