//! Error types and handling for Deckhand
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Variants are grouped by the area that raises them; the first failure of a
//! pipeline run is wrapped in [`DeckhandError::RepositoryFailed`] so the
//! operator sees which repository and action aborted the run.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Deckhand operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeckhandError {
    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(deckhand::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(deckhand::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(deckhand::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(deckhand::fs::io_error))]
    IoError { message: String },

    // Digest errors
    #[error("Failed to compute digest for {path}: {reason}")]
    #[diagnostic(
        code(deckhand::digest::failed),
        help("Every tracked file must exist and be readable before it can be pushed")
    )]
    DigestFailed { path: String, reason: String },

    // Dependency errors
    #[error("Circular dependency detected among: {}", .cycle.join(", "))]
    #[diagnostic(
        code(deckhand::deps::circular),
        help("Remove the circular dependency from the repositories' declared dependencies")
    )]
    CircularDependency { cycle: Vec<String> },

    // Template errors
    #[error("Failed to render template {template}: {reason}")]
    #[diagnostic(code(deckhand::template::render_failed))]
    TemplateFailed { template: String, reason: String },

    // Configuration errors
    #[error("Missing required setting: {setting}")]
    #[diagnostic(
        code(deckhand::config::missing),
        help("Add the setting to deckhand.yaml or context.yaml and re-run")
    )]
    ConfigMissing { setting: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(deckhand::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(deckhand::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(deckhand::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Provider not supported: {provider}")]
    #[diagnostic(
        code(deckhand::config::provider_not_supported),
        help("Supported providers: kind")
    )]
    ProviderNotSupported { provider: String },

    // Installation errors
    #[error("{name} is not installed")]
    #[diagnostic(
        code(deckhand::installation::not_found),
        help("Add the repository to installations.yaml")
    )]
    InstallationNotFound { name: String },

    #[error("No installations present")]
    #[diagnostic(
        code(deckhand::installation::none),
        help("Install your first repository and record it in installations.yaml")
    )]
    NoInstallations,

    // Execution errors
    #[error("Step '{step}' failed: `{command}`\n\n{output}")]
    #[diagnostic(code(deckhand::step::failed))]
    StepFailed {
        step: String,
        command: String,
        output: String,
    },

    #[error("{action} failed for repository '{repo}': {source}")]
    #[diagnostic(
        code(deckhand::pipeline::aborted),
        help(
            "Repositories processed before the failure were left applied. Fix the underlying problem and re-run; unchanged work is skipped."
        )
    )]
    RepositoryFailed {
        repo: String,
        action: String,
        #[source]
        source: Box<DeckhandError>,
    },

    #[error("Cannot {operation} repository '{repo}' while it is {stage}")]
    #[diagnostic(code(deckhand::workspace::invalid_stage))]
    InvalidStage {
        repo: String,
        stage: String,
        operation: String,
    },

    // Git errors
    #[error("Not in a git repository")]
    #[diagnostic(
        code(deckhand::git::not_in_repo),
        help("Run deckhand from your infrastructure repository or pass --workspace")
    )]
    NotInGitRepository,

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(deckhand::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Local changes out of sync with upstream")]
    #[diagnostic(
        code(deckhand::git::out_of_sync),
        help("Pull the latest changes first, or pass --force to build from local state")
    )]
    RemoteOutOfSync,
}

impl DeckhandError {
    /// Wrap an error with the repository and action that produced it
    pub fn in_repository(self, repo: impl Into<String>, action: impl ToString) -> Self {
        DeckhandError::RepositoryFailed {
            repo: repo.into(),
            action: action.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for DeckhandError {
    fn from(err: std::io::Error) -> Self {
        DeckhandError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for DeckhandError {
    fn from(err: serde_yaml::Error) -> Self {
        DeckhandError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DeckhandError {
    fn from(err: serde_json::Error) -> Self {
        DeckhandError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<git2::Error> for DeckhandError {
    fn from(err: git2::Error) -> Self {
        DeckhandError::GitOperationFailed {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for DeckhandError {
    fn from(err: inquire::InquireError) -> Self {
        DeckhandError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, DeckhandError>;
