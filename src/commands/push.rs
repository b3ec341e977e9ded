//! Push command implementation

use crate::cli::PushArgs;
use crate::commands::helpers::{highlight, resolve_root, success};
use crate::component::{self, CommandPublisher, ComponentSet, LocalCatalog, Publishers};
use crate::error::{DeckhandError, Result};
use crate::executor::ProcessRunner;
use crate::state::DigestLedger;

/// Run push command
pub fn run(workspace: Option<std::path::PathBuf>, args: PushArgs) -> Result<()> {
    let root = resolve_root(workspace)?;
    let file = if args.file.is_absolute() {
        args.file
    } else {
        root.join(&args.file)
    };
    if !file.is_file() {
        return Err(DeckhandError::ConfigNotFound {
            path: file.display().to_string(),
        });
    }

    let set = ComponentSet::load(&file, &root)?;
    highlight(&format!(
        "Pushing {} components to {}",
        set.components.len(),
        set.scope
    ));

    let mut ledger = DigestLedger::open(&root)?;
    let mut catalog = LocalCatalog::open(&root)?;
    let mut publisher = CommandPublisher::new(args.publisher, ProcessRunner);
    let mut publishers = Publishers::new(&mut publisher, &mut catalog);

    let summary = component::push_all(&mut ledger, &set.scope, &set.components, &mut publishers)?;

    for key in &summary.pushed {
        println!("  pushed    {}", key);
    }
    for key in &summary.unchanged {
        println!("  unchanged {}", key);
    }
    success(&format!(
        "{} pushed, {} unchanged",
        summary.pushed.len(),
        summary.unchanged.len()
    ));
    Ok(())
}
