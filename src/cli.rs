//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::component::COMPONENTS_FILE;

/// Deckhand - dependency-ordered infrastructure deployments
///
/// Build, deploy and tear down interdependent terraform/helm repositories in
/// a dependency-safe order, skipping work that has not changed.
#[derive(Parser, Debug)]
#[command(
    name = "deckhand",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Dependency-ordered infrastructure deployments",
    long_about = "Deckhand orders installed repositories by their declared dependencies and \
                  applies build, deploy, diff, bounce and destroy across them one at a time, \
                  stopping at the first failure. Unchanged work is skipped on re-runs.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  deckhand order\n    \
                  deckhand build --only console\n    \
                  deckhand deploy --all --commit \"deploy console\"\n    \
                  deckhand destroy --from bootstrap\n    \
                  deckhand push"
)]
pub struct Cli {
    /// Workspace directory (defaults to the enclosing git repository)
    #[arg(long, short = 'w', global = true, env = "DECKHAND_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare workspaces and run build steps
    Build(BuildArgs),

    /// Deploy changed repositories in dependency order
    Deploy(DeployArgs),

    /// Show what a deploy would change
    Diff,

    /// List repositories with uncommitted changes
    Diffed,

    /// Restart the workloads of one or all repositories
    Bounce(BounceArgs),

    /// Tear down one or all repositories in reverse dependency order
    Destroy(DestroyArgs),

    /// Remove a node from the provider before deleting it from the cluster
    Decommission(DecommissionArgs),

    /// Check provider and manifest configuration
    Validate(ValidateArgs),

    /// Publish changed artifacts and version tags
    Push(PushArgs),

    /// Print the deployment order
    Order(OrderArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Build every installed repository:\n    deckhand build\n\n\
                  Build one repository, even if the branch is behind upstream:\n    \
                  deckhand build --only console --force")]
pub struct BuildArgs {
    /// Build only this repository
    #[arg(long, value_name = "REPO")]
    pub only: Option<String>,

    /// Build even when the branch is behind its upstream
    #[arg(long)]
    pub force: bool,

    /// Re-run build steps whose inputs are unchanged
    #[arg(long)]
    pub rerun: bool,
}

/// Arguments for the deploy command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Deploy repositories with local changes:\n    deckhand deploy\n\n\
                  Deploy everything and commit:\n    deckhand deploy --all --commit \"upgrade\"\n\n\
                  Non-interactive deploy without notes:\n    deckhand deploy --all --silence\n\n\
                  Re-apply everything, even unchanged steps:\n    deckhand deploy --all --rerun")]
pub struct DeployArgs {
    /// Deploy every installed repository, not only changed ones
    #[arg(long)]
    pub all: bool,

    /// Skip the console and bootstrap repositories
    #[arg(long)]
    pub ignore_console: bool,

    /// Do not print notes or prompt for a commit message
    #[arg(long)]
    pub silence: bool,

    /// Re-run deploy steps whose inputs are unchanged
    #[arg(long)]
    pub rerun: bool,

    /// Force-push the deployment commit
    #[arg(long)]
    pub force: bool,

    /// Commit and push with this message after a successful deploy
    #[arg(long, value_name = "MESSAGE")]
    pub commit: Option<String>,
}

/// Arguments for the bounce command
#[derive(Parser, Debug)]
pub struct BounceArgs {
    /// Repository to bounce (defaults to all)
    pub repo: Option<String>,
}

/// Arguments for the destroy command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Destroy one repository:\n    deckhand destroy airflow\n\n\
                  Resume an interrupted destroy:\n    deckhand destroy --from bootstrap --yes")]
pub struct DestroyArgs {
    /// Repository to destroy (defaults to all)
    pub repo: Option<String>,

    /// Resume a destroy, starting at this repository
    #[arg(long, value_name = "REPO", conflicts_with = "repo")]
    pub from: Option<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for the decommission command
#[derive(Parser, Debug)]
pub struct DecommissionArgs {
    /// Node name as known to kubernetes
    pub node: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Validate only this repository
    #[arg(long, value_name = "REPO")]
    pub only: Option<String>,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Component list to push
    #[arg(long, short = 'f', value_name = "FILE", default_value = COMPONENTS_FILE)]
    pub file: PathBuf,

    /// Program invoked to publish artifacts
    #[arg(long, value_name = "PROGRAM", default_value = "plural", env = "DECKHAND_PUBLISHER")]
    pub publisher: String,
}

/// Arguments for the order command
#[derive(Parser, Debug)]
pub struct OrderArgs {
    /// Print the order as a JSON array
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long, short = 's')]
    pub shell: String,
}
