//! Validate command implementation

use crate::cli::ValidateArgs;
use crate::commands::helpers::{Project, highlight, success};
use crate::error::Result;

/// Run validate command
pub fn run(workspace: Option<std::path::PathBuf>, args: ValidateArgs) -> Result<()> {
    let project = Project::open(workspace)?;
    let provider = project.provider()?;

    println!(
        "Provider {}: cluster {} in {}, state bucket {}",
        provider.name(),
        provider.cluster(),
        provider.region(),
        provider.bucket()
    );

    for repo in project.targets(args.only.as_deref())? {
        highlight(&format!("Validating repository {}", repo));
        project.workspace(&repo, provider.as_ref())?.validate()?;
    }

    success("Workspace providers are properly configured!");
    Ok(())
}
