//! Bounce command implementation

use console::Style;

use crate::cli::BounceArgs;
use crate::commands::helpers::{Project, run_with_progress};
use crate::error::Result;
use crate::executor::{ActionKind, Executor, ProcessRunner};
use crate::pipeline::PipelineRun;
use crate::state::DigestLedger;

/// Run bounce command
pub fn run(workspace: Option<std::path::PathBuf>, args: BounceArgs) -> Result<()> {
    let project = Project::open(workspace)?;
    let provider = project.provider()?;
    let mut ledger = DigestLedger::open(&project.root)?;
    let mut runner = ProcessRunner;
    let mut executor = Executor::new(&mut runner, &mut ledger);

    let mut run = PipelineRun::new(ActionKind::Bounce, project.targets(args.repo.as_deref())?);
    run_with_progress(&mut run, |repo, reporter| {
        reporter.println(&format!(
            "{}",
            Style::new().yellow().apply_to(format!("bouncing deployments in {}", repo))
        ));
        project
            .workspace(repo, provider.as_ref())?
            .bounce(&mut executor)
    })
}
