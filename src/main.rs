//! Deckhand - dependency-ordered infrastructure deployments
//!
//! Orders interdependent terraform/helm repositories by their declared
//! dependencies and builds, deploys, diffs, bounces or destroys them one at a
//! time, skipping steps whose inputs have not changed since the last run.

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod component;
mod config;
mod error;
mod executor;
mod git;
mod hash;
mod pipeline;
mod progress;
mod provider;
mod resolver;
mod session;
mod state;
mod template;
mod workspace;

use cli::{Cli, Commands};

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "DECKHAND_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "deckhand=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let workspace = cli.workspace;
    let result = match cli.command {
        Commands::Build(args) => commands::build::run(workspace, args),
        Commands::Deploy(args) => commands::deploy::run(workspace, args),
        Commands::Diff => commands::diff::run(workspace),
        Commands::Diffed => commands::diffed::run(workspace),
        Commands::Bounce(args) => commands::bounce::run(workspace, args),
        Commands::Destroy(args) => commands::destroy::run(workspace, args),
        Commands::Decommission(args) => commands::decommission::run(workspace, args),
        Commands::Validate(args) => commands::validate::run(workspace, args),
        Commands::Push(args) => commands::push::run(workspace, args),
        Commands::Order(args) => commands::order::run(workspace, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(help) = e.help() {
            eprintln!("  help: {}", help);
        }
        std::process::exit(1);
    }
}
