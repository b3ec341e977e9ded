//! Deploy command implementation
//!
//! Deploys repositories in dependency order: only those with local changes,
//! or all of them with `--all`. The first failure aborts the run. After a
//! successful run the changes are committed and pushed once; `--force` only
//! affects that push.

use std::collections::HashSet;

use crate::cli::DeployArgs;
use crate::commands::helpers::{Project, highlight, is_interactive, run_with_progress};
use crate::error::Result;
use crate::executor::{ActionKind, Executor, ProcessRunner};
use crate::git;
use crate::pipeline::PipelineRun;
use crate::resolver;
use crate::session::Session;
use crate::state::DigestLedger;

/// Repositories managed by the platform itself
const CONSOLE_REPOS: [&str; 2] = ["console", "bootstrap"];

/// Run deploy command
pub fn run(workspace: Option<std::path::PathBuf>, args: DeployArgs) -> Result<()> {
    let project = Project::open(workspace)?;

    let order = if args.all {
        project.order()?
    } else {
        let changed: HashSet<String> = git::changed_repos(&project.root)?.into_iter().collect();
        resolver::sorted_changed_names(&project.installations.installations, &changed)?
    };

    let mut run = PipelineRun::new(ActionKind::Deploy, order);
    if args.ignore_console {
        run = run.skipping(|repo| CONSOLE_REPOS.contains(&repo));
    }

    highlight(&format!(
        "Deploying applications [{}] in topological order",
        run.targets().join(", ")
    ));

    let provider = project.provider()?;
    let mut ledger = DigestLedger::open(&project.root)?;
    let mut runner = ProcessRunner;
    let mut executor = Executor::new(&mut runner, &mut ledger).rerun(args.rerun);

    let result = run_with_progress(&mut run, |repo, reporter| {
        let mut workspace = project.workspace(repo, provider.as_ref())?;
        workspace.prepare()?;
        workspace.execute(ActionKind::Deploy, false, &mut executor)?;

        if !args.silence {
            if let Some(notes) = workspace.notes()? {
                reporter.println(&notes);
            }
        }
        Ok(())
    });

    if let Err(err) = result {
        println!(
            "It looks like your deployment failed. Repositories deployed before the failure were left in place; fix the problem and re-run to continue."
        );
        return Err(err);
    }

    highlight("==> Commit and push your changes to record your deployment");

    let message = match &args.commit {
        Some(message) => message.trim().to_string(),
        None if !args.silence => Session::new(is_interactive()).commit_message()?,
        None => String::new(),
    };

    if !message.is_empty() {
        highlight("Pushing upstream...");
        git::sync(&project.root, &message, args.force, &mut ProcessRunner)?;
    }

    Ok(())
}
