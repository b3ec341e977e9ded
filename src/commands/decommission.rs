//! Decommission command implementation

use crate::cli::DecommissionArgs;
use crate::commands::helpers::{Project, is_interactive, success};
use crate::error::Result;
use crate::session::Session;

/// Run decommission command
pub fn run(workspace: Option<std::path::PathBuf>, args: DecommissionArgs) -> Result<()> {
    let project = Project::open(workspace)?;
    let provider = project.provider()?;

    let mut session = Session::new(is_interactive()).assume_yes(args.yes);
    let question = format!(
        "Remove node {} from {} cluster {}?",
        args.node,
        provider.name(),
        provider.cluster()
    );
    if !session.confirm(&question)? {
        println!("Aborted, node {} was kept", args.node);
        return Ok(());
    }

    provider.decommission(&args.node)?;
    success(&format!("Node {} decommissioned", args.node));
    Ok(())
}
