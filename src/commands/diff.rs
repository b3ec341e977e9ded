//! Diff command implementation

use std::collections::HashSet;

use crate::commands::helpers::{Project, highlight, run_with_progress};
use crate::error::Result;
use crate::executor::{ActionKind, Executor, ProcessRunner};
use crate::git;
use crate::pipeline::PipelineRun;
use crate::resolver;
use crate::state::DigestLedger;

/// Run diff command over repositories with local changes
pub fn run(workspace: Option<std::path::PathBuf>) -> Result<()> {
    let project = Project::open(workspace)?;
    let changed: HashSet<String> = git::changed_repos(&project.root)?.into_iter().collect();
    let order = resolver::sorted_changed_names(&project.installations.installations, &changed)?;

    let mut run = PipelineRun::new(ActionKind::Diff, order);
    highlight(&format!(
        "Diffing applications [{}] in topological order",
        run.targets().join(", ")
    ));

    let provider = project.provider()?;
    let mut ledger = DigestLedger::open(&project.root)?;
    let mut runner = ProcessRunner;
    let mut executor = Executor::new(&mut runner, &mut ledger);

    run_with_progress(&mut run, |repo, _| {
        let mut workspace = project.workspace(repo, provider.as_ref())?;
        workspace.prepare()?;
        workspace.execute(ActionKind::Diff, false, &mut executor)
    })
}
