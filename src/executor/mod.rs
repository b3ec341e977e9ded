//! Per-repository action execution
//!
//! This module handles:
//! - Resolving the steps of an action for one repository ([`resolve`])
//! - Running the steps in sequence, stopping at the first failure ([`Executor`])
//! - Skipping incremental steps whose target is unchanged since it was last applied

pub mod step;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::read_yaml;
use crate::error::{DeckhandError, Result};
use crate::hash;
use crate::state::{DigestLedger, step_key};

pub use step::{ProcessRunner, Step, StepRunner, StepSpec};

/// Per-repository step definitions file
pub const EXECUTION_FILE: &str = "deploy.yaml";

/// Action applied across repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Build,
    Validate,
    Deploy,
    Diff,
    Bounce,
    Destroy,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Build,
        ActionKind::Validate,
        ActionKind::Deploy,
        ActionKind::Diff,
        ActionKind::Bounce,
        ActionKind::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Build => "build",
            ActionKind::Validate => "validate",
            ActionKind::Deploy => "deploy",
            ActionKind::Diff => "diff",
            ActionKind::Bounce => "bounce",
            ActionKind::Destroy => "destroy",
        }
    }

    /// Whether targeted steps of this action are skipped when unchanged
    pub fn is_incremental(&self) -> bool {
        matches!(self, ActionKind::Build | ActionKind::Deploy)
    }

    /// Whether this action walks repositories in reverse dependency order
    pub fn is_reversed(&self) -> bool {
        matches!(self, ActionKind::Destroy)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DeckhandError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| DeckhandError::ConfigInvalid {
                message: format!("unknown action '{}'", s),
            })
    }
}

/// Contents of a repository's `deploy.yaml`: action name to ordered steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionFile {
    pub actions: BTreeMap<String, Vec<StepSpec>>,
}

impl ExecutionFile {
    /// Load and check a `deploy.yaml`; unknown action names are rejected
    pub fn load(path: &Path) -> Result<Self> {
        let file: ExecutionFile = read_yaml(path)?;
        for name in file.actions.keys() {
            name.parse::<ActionKind>()
                .map_err(|_| DeckhandError::ConfigInvalid {
                    message: format!("{}: unknown action '{}'", path.display(), name),
                })?;
        }
        Ok(file)
    }

    pub fn steps(&self, action: ActionKind) -> &[StepSpec] {
        self.actions
            .get(action.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Resolve the steps of `action` for the repository at `repo_dir`
///
/// A `deploy.yaml` in the repository is authoritative. Without one, steps are
/// derived from the repository layout: `terraform/` and `helm/<repo>/`.
pub fn resolve(repo_dir: &Path, repo: &str, action: ActionKind) -> Result<Vec<Step>> {
    let execution_file = repo_dir.join(EXECUTION_FILE);
    if execution_file.is_file() {
        let file = ExecutionFile::load(&execution_file)?;
        let steps: Vec<Step> = file
            .steps(action)
            .iter()
            .cloned()
            .map(|spec| spec.into_step(repo_dir))
            .collect();
        debug!(repo = %repo, action = %action, count = steps.len(), "Resolved steps from {}", EXECUTION_FILE);
        return Ok(steps);
    }

    let steps = default_steps(repo_dir, repo, action);
    debug!(repo = %repo, action = %action, count = steps.len(), "Resolved default steps");
    Ok(steps)
}

fn default_steps(repo_dir: &Path, repo: &str, action: ActionKind) -> Vec<Step> {
    let terraform = repo_dir.join("terraform");
    let helm = repo_dir.join("helm").join(repo);

    let tf = |name: &str, args: &[&str]| Step::new(name, &terraform, "terraform", args);
    let chart = |name: &str, args: &[&str]| Step::new(name, &helm, "helm", args);

    let candidates = match action {
        ActionKind::Build => vec![
            tf("terraform-init", &["init", "-upgrade"]),
            chart("helm-dependencies", &["dependency", "update"]),
        ],
        ActionKind::Validate => vec![tf("terraform-validate", &["validate"])],
        ActionKind::Deploy => vec![
            tf("terraform-init", &["init", "-upgrade"]),
            tf("terraform-apply", &["apply", "-auto-approve"]).with_target(&terraform),
            chart(
                "helm-upgrade",
                &[
                    "upgrade",
                    "--install",
                    "--namespace",
                    repo,
                    "--create-namespace",
                    repo,
                    ".",
                ],
            )
            .with_target(&helm),
        ],
        ActionKind::Diff => vec![
            tf("terraform-plan", &["plan"]),
            chart("helm-diff", &["diff", "upgrade", "--namespace", repo, repo, "."]),
        ],
        ActionKind::Bounce => vec![Step::new(
            "rollout-restart",
            repo_dir,
            "kubectl",
            &["rollout", "restart", "deployments", "-n", repo],
        )],
        ActionKind::Destroy => vec![
            chart("helm-uninstall", &["uninstall", "--namespace", repo, repo]),
            tf("terraform-destroy", &["destroy", "-auto-approve"]),
        ],
    };

    candidates
        .into_iter()
        .filter(|step| step.wkdir.is_dir())
        .collect()
}

/// Runs resolved steps for one repository at a time
pub struct Executor<'a> {
    runner: &'a mut dyn StepRunner,
    ledger: &'a mut DigestLedger,
    rerun: bool,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a mut dyn StepRunner, ledger: &'a mut DigestLedger) -> Self {
        Self {
            runner,
            ledger,
            rerun: false,
        }
    }

    /// Re-run incremental steps even when their target is unchanged
    pub fn rerun(mut self, rerun: bool) -> Self {
        self.rerun = rerun;
        self
    }

    pub fn runner(&mut self) -> &mut dyn StepRunner {
        &mut *self.runner
    }

    /// Drop applied digests of a repository so its next deploy runs every step
    pub fn forget(&mut self, repo: &str) -> Result<()> {
        self.ledger.forget_repository(repo)
    }

    /// Run `steps` strictly in order; the first failure stops the rest
    ///
    /// For incremental actions a step with a target is skipped when the
    /// target's digest matches the last applied one. The digest is recorded
    /// only after the step succeeds.
    pub fn run(&mut self, repo: &str, action: ActionKind, steps: &[Step]) -> Result<()> {
        for step in steps {
            let tracked = match (&step.target, action.is_incremental()) {
                (Some(target), true) => {
                    let key = step_key(repo, action.as_str(), &step.name);
                    let digest = hash::digest(&[target])?;
                    if !self.rerun && hash::verify_hash(self.ledger.step(&key), &digest) {
                        info!(repo = %repo, step = %step.name, "Unchanged, skipping");
                        continue;
                    }
                    Some((key, digest))
                }
                _ => None,
            };

            info!(repo = %repo, action = %action, step = %step.name, "Running step");
            let output = self.runner.run(step)?;
            debug!(step = %step.name, "{}", output.trim_end());

            if let Some((key, digest)) = tracked {
                self.ledger.record_step(&key, &digest)?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with_layout(root: &Path, repo: &str) -> std::path::PathBuf {
        let dir = root.join(repo);
        fs::create_dir_all(dir.join("terraform")).unwrap();
        fs::write(dir.join("terraform/main.tf"), "resource \"null\" \"x\" {}").unwrap();
        fs::create_dir_all(dir.join("helm").join(repo)).unwrap();
        fs::write(dir.join("helm").join(repo).join("Chart.yaml"), "name: x").unwrap();
        dir
    }

    #[test]
    fn test_action_kind_round_trip_names() {
        for action in ActionKind::ALL {
            assert_eq!(action.as_str().parse::<ActionKind>().unwrap(), action);
        }
        assert!("rollback".parse::<ActionKind>().is_err());
        assert!(ActionKind::Destroy.is_reversed());
        assert!(ActionKind::Deploy.is_incremental());
        assert!(!ActionKind::Diff.is_incremental());
    }

    #[test]
    fn test_default_deploy_steps() {
        let temp = TempDir::new().unwrap();
        let dir = repo_with_layout(temp.path(), "console");

        let steps = resolve(&dir, "console", ActionKind::Deploy).unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["terraform-init", "terraform-apply", "helm-upgrade"]);
        assert_eq!(
            steps[2].command_line(),
            "helm upgrade --install --namespace console --create-namespace console ."
        );
        assert_eq!(steps[1].target, Some(dir.join("terraform")));
    }

    #[test]
    fn test_default_steps_skip_missing_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("postgres");
        fs::create_dir_all(dir.join("terraform")).unwrap();

        let steps = resolve(&dir, "postgres", ActionKind::Destroy).unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["terraform-destroy"]);
    }

    #[test]
    fn test_bounce_runs_without_chart() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("postgres");
        fs::create_dir_all(dir.join("terraform")).unwrap();

        let steps = resolve(&dir, "postgres", ActionKind::Bounce).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "rollout-restart");
        assert_eq!(steps[0].wkdir, dir);
        assert_eq!(
            steps[0].command_line(),
            "kubectl rollout restart deployments -n postgres"
        );
    }

    #[test]
    fn test_execution_file_is_authoritative() {
        let temp = TempDir::new().unwrap();
        let dir = repo_with_layout(temp.path(), "console");
        fs::write(
            dir.join(EXECUTION_FILE),
            r#"
deploy:
  - name: apply
    wkdir: terraform
    command: sh
    args: ["-c", "true"]
    target: terraform
"#,
        )
        .unwrap();

        let deploy = resolve(&dir, "console", ActionKind::Deploy).unwrap();
        assert_eq!(deploy.len(), 1);
        assert_eq!(deploy[0].wkdir, dir.join("terraform"));

        assert!(resolve(&dir, "console", ActionKind::Destroy).unwrap().is_empty());
    }

    #[test]
    fn test_execution_file_rejects_unknown_action() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("console");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(EXECUTION_FILE), "rollback: []\n").unwrap();

        assert!(matches!(
            resolve(&dir, "console", ActionKind::Deploy),
            Err(DeckhandError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let mut ledger = DigestLedger::open(temp.path()).unwrap();
        let mut runner = RecordingRunner::failing(&["second"]);
        let steps = vec![
            Step::new("first", temp.path(), "true", &[]),
            Step::new("second", temp.path(), "false", &[]),
            Step::new("third", temp.path(), "true", &[]),
        ];

        let result = Executor::new(&mut runner, &mut ledger).run("console", ActionKind::Diff, &steps);

        assert!(matches!(result, Err(DeckhandError::StepFailed { .. })));
        assert_eq!(runner.names(), vec!["first", "second"]);
    }

    #[test]
    fn test_unchanged_target_is_skipped() {
        let temp = TempDir::new().unwrap();
        let dir = repo_with_layout(temp.path(), "console");
        let steps = resolve(&dir, "console", ActionKind::Deploy).unwrap();
        let mut ledger = DigestLedger::open(temp.path()).unwrap();

        let mut first = RecordingRunner::default();
        Executor::new(&mut first, &mut ledger)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();
        assert_eq!(first.ran.len(), 3);

        let mut second = RecordingRunner::default();
        Executor::new(&mut second, &mut ledger)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();
        assert_eq!(second.names(), vec!["terraform-init"]);

        fs::write(dir.join("terraform/main.tf"), "changed").unwrap();
        let mut third = RecordingRunner::default();
        Executor::new(&mut third, &mut ledger)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();
        assert_eq!(third.names(), vec!["terraform-init", "terraform-apply"]);
    }

    #[test]
    fn test_rerun_ignores_unchanged_targets() {
        let temp = TempDir::new().unwrap();
        let dir = repo_with_layout(temp.path(), "console");
        let steps = resolve(&dir, "console", ActionKind::Deploy).unwrap();
        let mut ledger = DigestLedger::open(temp.path()).unwrap();

        let mut runner = RecordingRunner::default();
        Executor::new(&mut runner, &mut ledger)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();

        let mut rerun = RecordingRunner::default();
        Executor::new(&mut rerun, &mut ledger)
            .rerun(true)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();
        assert_eq!(rerun.ran.len(), 3);
    }

    #[test]
    fn test_failed_step_does_not_advance_digest() {
        let temp = TempDir::new().unwrap();
        let dir = repo_with_layout(temp.path(), "console");
        let steps = resolve(&dir, "console", ActionKind::Deploy).unwrap();
        let mut ledger = DigestLedger::open(temp.path()).unwrap();

        let mut failing = RecordingRunner::failing(&["terraform-apply"]);
        assert!(
            Executor::new(&mut failing, &mut ledger)
                .run("console", ActionKind::Deploy, &steps)
                .is_err()
        );
        assert_eq!(ledger.step("console/deploy/terraform-apply"), "");

        let mut retry = RecordingRunner::default();
        Executor::new(&mut retry, &mut ledger)
            .run("console", ActionKind::Deploy, &steps)
            .unwrap();
        assert_eq!(retry.ran.len(), 3);
    }
}
