//! Relations command implementation.

use crate::cli::args::PathArgs;
use crate::cli::output::{Listing, Output};
use crate::error::Result;
use crate::workspace::Workspace;

pub fn run(workspace: &Workspace, args: &PathArgs, output: &Output) -> Result<()> {
    let items = workspace.resolve_relations(&args.path)?;
    let dangling = items
        .iter()
        .flat_map(|r| &r.relation.files)
        .filter(|entry| entry.is_dangling())
        .count();
    if dangling > 0 {
        output.info(&format!("{} referenced document(s) not found", dangling));
    }
    output.print(&Listing { items })
}
