//! Git operations on the infrastructure repository
//!
//! This module handles:
//! - Locating the work tree root
//! - Checking the current branch against its upstream
//! - Listing repositories with uncommitted changes
//! - Committing and pushing after a deploy
//!
//! Reads go through `git2`. Commit and push shell out to the git CLI as steps so
//! they use the operator's own credential helpers and hooks.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use git2::{BranchType, Repository, StatusOptions};
use tracing::{debug, info};

use crate::error::{DeckhandError, Result};
use crate::executor::{Step, StepRunner};

/// Open the repository enclosing `root`, which may sit below the work tree root
fn open(root: &Path) -> Result<Repository> {
    Repository::discover(root).map_err(|_| DeckhandError::NotInGitRepository)
}

/// Location of `root` inside the work tree as a `/`-terminated status path prefix
fn workspace_prefix(repo: &Repository, root: &Path) -> Result<String> {
    let workdir = repo.workdir().ok_or(DeckhandError::NotInGitRepository)?;
    let workdir = dunce::canonicalize(workdir).unwrap_or_else(|_| workdir.to_path_buf());
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let relative = root
        .strip_prefix(&workdir)
        .map_err(|_| DeckhandError::NotInGitRepository)?;

    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(format!("{}/", part.to_string_lossy())),
            _ => None,
        })
        .collect())
}

/// Find the work tree root of the repository containing `start`
pub fn repo_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start).map_err(|_| DeckhandError::NotInGitRepository)?;
    let workdir = repo.workdir().ok_or(DeckhandError::NotInGitRepository)?;
    // Resolve symlinks (macOS /var -> /private/var) without UNC prefixes on Windows
    Ok(dunce::canonicalize(workdir).unwrap_or_else(|_| workdir.to_path_buf()))
}

/// Name of the checked out branch
pub fn current_branch(root: &Path) -> Result<String> {
    let repo = open(root)?;
    let head = repo.head()?;
    head.shorthand()
        .map(str::to_string)
        .ok_or_else(|| DeckhandError::GitOperationFailed {
            message: "HEAD is not a named branch".to_string(),
        })
}

/// Whether the current branch has nothing to pull from its upstream
///
/// Compares against the last fetched upstream ref; nothing is fetched here. A
/// branch without an upstream, a detached HEAD and an unborn branch all count
/// as in sync.
pub fn upstream_in_sync(root: &Path) -> Result<bool> {
    let repo = open(root)?;
    let head = match repo.head() {
        Ok(head) => head,
        Err(_) => return Ok(true),
    };
    if !head.is_branch() {
        return Ok(true);
    }
    let (Some(name), Some(local)) = (head.shorthand(), head.target()) else {
        return Ok(true);
    };

    let branch = repo.find_branch(name, BranchType::Local)?;
    let upstream = match branch.upstream() {
        Ok(upstream) => upstream,
        Err(_) => {
            debug!(branch = %name, "No upstream configured");
            return Ok(true);
        }
    };
    let Some(remote) = upstream.get().target() else {
        return Ok(true);
    };

    let (ahead, behind) = repo.graph_ahead_behind(local, remote)?;
    debug!(branch = %name, ahead, behind, "Compared with upstream");
    Ok(behind == 0)
}

/// Directories directly under `root` holding uncommitted or untracked changes
pub fn changed_repos(root: &Path) -> Result<BTreeSet<String>> {
    let repo = open(root)?;
    let prefix = workspace_prefix(&repo, root)?;
    debug!(prefix = %prefix, "Listing changed repositories");
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(false)
        .include_ignored(false);

    let statuses = repo.statuses(Some(&mut options))?;
    let mut changed = BTreeSet::new();
    for entry in statuses.iter() {
        if entry.status().is_ignored() {
            continue;
        }
        // Status paths are relative to the work tree, not the workspace
        let Some(path) = entry.path().and_then(|p| p.strip_prefix(prefix.as_str())) else {
            continue;
        };
        // Untracked directories are reported as `dir/`; root files belong to no repository
        let mut components = Path::new(path).components();
        let first = components.next();
        let nested = components.next().is_some() || path.ends_with('/');
        if let (Some(Component::Normal(first)), true) = (first, nested) {
            changed.insert(first.to_string_lossy().into_owned());
        }
    }
    Ok(changed)
}

/// Stage everything, commit with `message` and push the current branch
pub fn sync(root: &Path, message: &str, force: bool, runner: &mut dyn StepRunner) -> Result<()> {
    let branch = current_branch(root)?;
    let mut push = vec!["push"];
    if force {
        push.push("-f");
    }
    push.extend(["origin", branch.as_str()]);

    let steps = [
        Step::new("git-add", root, "git", &["add", "."]),
        Step::new("git-commit", root, "git", &["commit", "-m", message]),
        Step::new("git-push", root, "git", &push),
    ];
    for step in &steps {
        runner.run(step)?;
    }

    info!(branch = %branch, "Pushed changes upstream");
    Ok(())
}
