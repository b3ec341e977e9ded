//! Diffed command implementation

use crate::commands::helpers::resolve_root;
use crate::config::Installations;
use crate::error::Result;
use crate::git;

/// Print installed repositories with uncommitted changes
pub fn run(workspace: Option<std::path::PathBuf>) -> Result<()> {
    let root = resolve_root(workspace)?;
    let installations = Installations::load(&root)?;

    for repo in git::changed_repos(&root)? {
        if installations.find(&repo).is_some() {
            println!("{}", repo);
        }
    }

    Ok(())
}
