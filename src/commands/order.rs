//! Order command implementation

use crate::cli::OrderArgs;
use crate::commands::helpers::resolve_root;
use crate::config::Installations;
use crate::error::Result;
use crate::resolver;

/// Print installed repositories in dependency order
pub fn run(workspace: Option<std::path::PathBuf>, args: OrderArgs) -> Result<()> {
    let root = resolve_root(workspace)?;
    let installations = Installations::load_non_empty(&root)?;
    let order = resolver::sorted_names(&installations.installations)?;

    if args.json {
        println!("{}", serde_json::to_string(&order)?);
    } else {
        for repo in &order {
            println!("{}", repo);
        }
    }

    Ok(())
}
