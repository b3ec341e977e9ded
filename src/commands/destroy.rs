//! Destroy command implementation
//!
//! Tears repositories down in reverse dependency order so nothing is removed
//! while a dependent still relies on it. `--from` resumes an interrupted run.

use console::Style;

use crate::cli::DestroyArgs;
use crate::commands::helpers::{Project, highlight, is_interactive, run_with_progress, success};
use crate::error::Result;
use crate::executor::{ActionKind, Executor, ProcessRunner};
use crate::pipeline::{PipelineRun, RunState};
use crate::session::Session;
use crate::state::DigestLedger;

/// Run destroy command
pub fn run(workspace: Option<std::path::PathBuf>, args: DestroyArgs) -> Result<()> {
    let project = Project::open(workspace)?;

    let mut session = Session::new(is_interactive()).assume_yes(args.yes);
    if !session.confirm("Are you sure you want to destroy this workspace?")? {
        println!("Aborted, nothing was destroyed");
        return Ok(());
    }

    let mut run = match (&args.repo, &args.from) {
        (Some(repo), _) => {
            PipelineRun::new(ActionKind::Destroy, project.targets(Some(repo.as_str()))?)
        }
        (None, Some(from)) => {
            PipelineRun::new(ActionKind::Destroy, project.order()?).starting_from(from)?
        }
        (None, None) => PipelineRun::new(ActionKind::Destroy, project.order()?),
    };

    highlight(&format!("Destroying applications [{}]", run.targets().join(", ")));

    let provider = project.provider()?;
    let mut ledger = DigestLedger::open(&project.root)?;
    let mut runner = ProcessRunner;
    let mut executor = Executor::new(&mut runner, &mut ledger);

    let result = run_with_progress(&mut run, |repo, reporter| {
        reporter.println(&format!(
            "{}",
            Style::new().red().apply_to(format!("destroying {}", repo))
        ));
        let mut workspace = project.workspace(repo, provider.as_ref())?;
        workspace.prepare()?;
        workspace.destroy(&mut executor)
    });

    if let Err(err) = result {
        if args.repo.is_none() {
            if let RunState::Aborted { repo } = run.state() {
                println!(
                    "The destroy stopped at {}. Fix the problem, then resume with `deckhand destroy --from {}`",
                    repo, repo
                );
            }
        }
        return Err(err);
    }

    success("Workspace destroyed");
    Ok(())
}
