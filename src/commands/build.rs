//! Build command implementation
//!
//! Prepares each repository's workspace and runs its build steps, in
//! dependency order.

use crate::cli::BuildArgs;
use crate::commands::helpers::{Project, highlight, run_with_progress, success};
use crate::error::Result;
use crate::executor::{ActionKind, Executor, ProcessRunner};
use crate::git;
use crate::pipeline::PipelineRun;
use crate::state::DigestLedger;

/// Run build command
pub fn run(workspace: Option<std::path::PathBuf>, args: BuildArgs) -> Result<()> {
    let project = Project::open(workspace)?;
    let in_sync = args.force || git::upstream_in_sync(&project.root)?;

    let provider = project.provider()?;
    let mut ledger = DigestLedger::open(&project.root)?;
    let mut runner = ProcessRunner;
    let mut executor = Executor::new(&mut runner, &mut ledger).rerun(args.rerun);

    let mut run = PipelineRun::new(ActionKind::Build, project.targets(args.only.as_deref())?);
    run_with_progress(&mut run, |repo, reporter| {
        reporter.println(&format!("Building workspace for {}", repo));
        let mut workspace = project
            .workspace(repo, provider.as_ref())?
            .with_upstream_in_sync(in_sync);
        workspace.prepare()?;
        workspace.execute(ActionKind::Build, args.force, &mut executor)
    })?;

    success(&format!("Finished building {} repositories", run.targets().len()));
    highlight("Run `deckhand deploy` to apply the changes");
    Ok(())
}
