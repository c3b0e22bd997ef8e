//! Tree and directory commands.

use crate::cli::args::{DirArgs, TreeArgs};
use crate::cli::output::{Listing, Output};
use crate::error::Result;
use crate::workspace::Workspace;

pub fn tree(workspace: &Workspace, args: &TreeArgs, output: &Output) -> Result<()> {
    if args.paths {
        for path in workspace.index().walk_documents()? {
            output.print_raw(&path.display().to_string());
        }
        return Ok(());
    }

    let items = workspace.get_tree()?;
    output.print(&Listing { items })
}

pub fn dir(workspace: &Workspace, args: &DirArgs, output: &Output) -> Result<()> {
    let view = workspace.get_directory(args.path.as_deref().unwrap_or(""))?;
    output.print(&view)
}
