//! Per-repository workspace lifecycle
//!
//! ```text
//! Uninitialized ─▶ Prepared ─▶ Validated ─▶ Executed(action) ─▶ Bounced | Destroyed
//! ```
//!
//! - `prepare` renders the terraform backend and the repository's scaffold
//!   templates against the manifest and context
//! - `validate` checks provider and manifest settings without touching
//!   anything outside the process
//! - `execute` runs the steps of an action through an [`Executor`]
//! - `bounce` restarts workloads, `destroy` tears the repository down

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{Context, Installation, ProjectManifest};
use crate::error::{DeckhandError, Result};
use crate::executor::{self, ActionKind, Executor};
use crate::provider::{BackendContext, Provider};
use crate::template::{self, TemplateVars};

/// Directory of scaffold templates inside a repository
pub const TEMPLATES_DIR: &str = "templates";

/// Extension marking a file as a template
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Rendered terraform backend, inside the repository's `terraform/`
pub const BACKEND_FILE: &str = "backend.tf";

/// Post-deploy notes shown to the operator
pub const NOTES_FILE: &str = "NOTES.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    Prepared,
    Validated,
    Executed(ActionKind),
    Bounced,
    Destroyed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Uninitialized => f.write_str("uninitialized"),
            Stage::Prepared => f.write_str("prepared"),
            Stage::Validated => f.write_str("validated"),
            Stage::Executed(action) => write!(f, "executed ({})", action),
            Stage::Bounced => f.write_str("bounced"),
            Stage::Destroyed => f.write_str("destroyed"),
        }
    }
}

/// One installed repository and everything needed to act on it
pub struct Workspace<'a> {
    root: PathBuf,
    installation: &'a Installation,
    manifest: &'a ProjectManifest,
    context: &'a Context,
    provider: &'a dyn Provider,
    upstream_in_sync: bool,
    stage: Stage,
}

impl<'a> Workspace<'a> {
    pub fn new(
        root: &Path,
        installation: &'a Installation,
        manifest: &'a ProjectManifest,
        context: &'a Context,
        provider: &'a dyn Provider,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            installation,
            manifest,
            context,
            provider,
            upstream_in_sync: true,
            stage: Stage::Uninitialized,
        }
    }

    /// Record whether the local branch is in sync with its upstream
    pub fn with_upstream_in_sync(mut self, in_sync: bool) -> Self {
        self.upstream_in_sync = in_sync;
        self
    }

    pub fn name(&self) -> &str {
        self.installation.name()
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(self.name())
    }

    #[cfg(test)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn require(&self, operation: &str, allowed: impl Fn(Stage) -> bool) -> Result<()> {
        if allowed(self.stage) {
            return Ok(());
        }
        Err(DeckhandError::InvalidStage {
            repo: self.name().to_string(),
            stage: self.stage.to_string(),
            operation: operation.to_string(),
        })
    }

    /// Values visible to this repository's templates
    pub fn template_vars(&self) -> TemplateVars {
        let mut vars = self.manifest.template_vars();
        if let Some(config) = self.context.repo_config(self.name()) {
            vars.extend(config.template_vars());
        }
        vars.insert("repo".to_string(), self.name().to_string());
        vars.insert("namespace".to_string(), self.name().to_string());
        vars
    }

    fn state_prefix(&self) -> String {
        match self.manifest.bucket_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, self.name()),
            _ => self.name().to_string(),
        }
    }

    /// Render the backend configuration and every scaffold template
    pub fn prepare(&mut self) -> Result<()> {
        self.require("prepare", |stage| {
            matches!(stage, Stage::Uninitialized | Stage::Prepared)
        })?;

        let dir = self.dir();
        let terraform = dir.join("terraform");
        if terraform.is_dir() {
            let ctx = BackendContext::from_config(self.context.repo_config(self.name()));
            let backend = self.provider.create_backend(&self.state_prefix(), &ctx)?;
            write_file(&terraform.join(BACKEND_FILE), &backend)?;
            debug!(repo = %self.name(), "Rendered terraform backend");
        }

        let vars = self.template_vars();
        let rendered = render_templates(&dir, &vars)?;
        info!(repo = %self.name(), templates = rendered, "Prepared workspace");

        self.stage = Stage::Prepared;
        Ok(())
    }

    /// Check manifest, provider and trust provider settings
    pub fn validate(&mut self) -> Result<()> {
        self.require("validate", |stage| {
            matches!(stage, Stage::Uninitialized | Stage::Prepared | Stage::Validated)
        })?;

        self.manifest.validate()?;
        self.provider.validate()?;

        if let Some(oidc) = &self.installation.oidc_provider {
            if oidc.client_id.trim().is_empty() {
                return Err(DeckhandError::ConfigMissing {
                    setting: format!("oidc_provider.client_id ({})", self.name()),
                });
            }
            if oidc.redirect_uris.is_empty() {
                return Err(DeckhandError::ConfigMissing {
                    setting: format!("oidc_provider.redirect_uris ({})", self.name()),
                });
            }
        }

        if self.stage == Stage::Prepared || self.stage == Stage::Uninitialized {
            self.stage = Stage::Validated;
        }
        Ok(())
    }

    /// Run the steps of `action`
    ///
    /// Building from a branch behind its upstream is refused unless `force`.
    pub fn execute(&mut self, action: ActionKind, force: bool, executor: &mut Executor<'_>) -> Result<()> {
        self.require("execute", |stage| {
            matches!(stage, Stage::Prepared | Stage::Validated | Stage::Executed(_))
        })?;

        if action == ActionKind::Build && !force && !self.upstream_in_sync {
            return Err(DeckhandError::RemoteOutOfSync);
        }

        let steps = executor::resolve(&self.dir(), self.name(), action)?;
        executor.run(self.name(), action, &steps)?;
        self.stage = Stage::Executed(action);
        Ok(())
    }

    /// Restart the repository's workloads in place
    pub fn bounce(&mut self, executor: &mut Executor<'_>) -> Result<()> {
        self.require("bounce", |stage| stage != Stage::Destroyed)?;

        self.provider.kube_config(executor.runner())?;
        let steps = executor::resolve(&self.dir(), self.name(), ActionKind::Bounce)?;
        executor.run(self.name(), ActionKind::Bounce, &steps)?;
        self.stage = Stage::Bounced;
        Ok(())
    }

    /// Tear the repository down and forget its applied digests
    pub fn destroy(&mut self, executor: &mut Executor<'_>) -> Result<()> {
        self.require("destroy", |stage| stage != Stage::Destroyed)?;

        self.provider.kube_config(executor.runner())?;
        let steps = executor::resolve(&self.dir(), self.name(), ActionKind::Destroy)?;
        executor.run(self.name(), ActionKind::Destroy, &steps)?;
        executor.forget(self.name())?;
        self.stage = Stage::Destroyed;
        Ok(())
    }

    /// Rendered post-deploy notes, if the repository ships any
    pub fn notes(&self) -> Result<Option<String>> {
        let path = self.dir().join(NOTES_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = read_file(&path)?;
        template::render(NOTES_FILE, &content, &self.template_vars()).map(Some)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DeckhandError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DeckhandError::FileWriteFailed {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }
    fs::write(path, content).map_err(|e| DeckhandError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Render `<dir>/templates/**/*.tpl` into `<dir>/**`, dropping the extension
fn render_templates(dir: &Path, vars: &TemplateVars) -> Result<usize> {
    let templates = dir.join(TEMPLATES_DIR);
    if !templates.is_dir() {
        return Ok(0);
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(&templates) {
        let entry = entry.map_err(|e| DeckhandError::FileReadFailed {
            path: templates.display().to_string(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
        {
            sources.push(entry.into_path());
        }
    }
    sources.sort();

    for source in &sources {
        let relative = source.strip_prefix(&templates).unwrap_or(source);
        let name = relative.to_string_lossy().replace('\\', "/");
        let rendered = template::render(&name, &read_file(source)?, vars)?;
        write_file(&dir.join(relative.with_extension("")), &rendered)?;
    }

    Ok(sources.len())
}
