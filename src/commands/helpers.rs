//! Command helper utilities

use std::path::PathBuf;

use console::{Style, Term};
use tracing::debug;

use crate::config::{Context, Installations, ProjectManifest};
use crate::error::{DeckhandError, Result};
use crate::git;
use crate::pipeline::PipelineRun;
use crate::progress::{self, ProgressReporter};
use crate::provider::{self, Provider};
use crate::resolver;
use crate::workspace::Workspace;

/// Resolve the workspace root
///
/// An explicit path is used as given. Otherwise the root is the work tree of
/// the git repository enclosing the current directory.
pub fn resolve_root(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => dunce::canonicalize(&path).map_err(|_| DeckhandError::FileNotFound {
            path: path.display().to_string(),
        }),
        None => {
            let cwd = std::env::current_dir().map_err(|e| DeckhandError::IoError {
                message: format!("Failed to get current directory: {}", e),
            })?;
            git::repo_root(&cwd)
        }
    }
}

/// Whether prompts can be shown
pub fn is_interactive() -> bool {
    Term::stdout().is_term()
}

/// Print a highlighted header line
pub fn highlight(message: &str) {
    println!("{}", Style::new().bold().cyan().apply_to(message));
}

/// Print a success line
pub fn success(message: &str) {
    println!("{}", Style::new().bold().green().apply_to(message));
}

/// Everything a command needs about the workspace
pub struct Project {
    pub root: PathBuf,
    pub manifest: ProjectManifest,
    pub context: Context,
    pub installations: Installations,
}

impl Project {
    pub fn open(workspace: Option<PathBuf>) -> Result<Self> {
        let root = resolve_root(workspace)?;
        let installations = Installations::load_non_empty(&root)?;
        let manifest = ProjectManifest::load(&root)?;
        let context = Context::load(&root)?;
        Ok(Self {
            root,
            manifest,
            context,
            installations,
        })
    }

    pub fn provider(&self) -> Result<Box<dyn Provider>> {
        provider::from_manifest(&self.manifest, &self.root)
    }

    /// Every installed repository in dependency order
    pub fn order(&self) -> Result<Vec<String>> {
        resolver::sorted_names(&self.installations.installations)
    }

    /// `only` when given and installed, otherwise the full dependency order
    pub fn targets(&self, only: Option<&str>) -> Result<Vec<String>> {
        match only {
            Some(name) => Ok(vec![self.installations.get(name)?.name().to_string()]),
            None => self.order(),
        }
    }

    pub fn workspace<'a>(&'a self, name: &str, provider: &'a dyn Provider) -> Result<Workspace<'a>> {
        let installation = self.installations.get(name)?;
        Ok(Workspace::new(
            &self.root,
            installation,
            &self.manifest,
            &self.context,
            provider,
        ))
    }
}

/// Execute a pipeline run with progress reporting
pub fn run_with_progress<F>(run: &mut PipelineRun, mut apply: F) -> Result<()>
where
    F: FnMut(&str, &dyn ProgressReporter) -> Result<()>,
{
    let total = run.targets().len();
    debug!(action = %run.action(), targets = ?run.targets(), "Running pipeline");
    let mut reporter = progress::reporter(total);
    let mut current = 0;

    let result = run.execute(|repo| {
        current += 1;
        reporter.start_target(repo, current, total);
        apply(repo, reporter.as_ref())?;
        reporter.finish_target(repo);
        Ok(())
    });

    match result {
        Ok(()) => {
            reporter.finish();
            Ok(())
        }
        Err(err) => {
            reporter.abandon();
            Err(err)
        }
    }
}
