//! Create command implementation.

use crate::cli::args::CreateArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::workspace::Workspace;

pub fn run(workspace: &Workspace, args: &CreateArgs, output: &Output) -> Result<()> {
    let created = workspace.create_document(&args.dir)?;
    output.info(&format!("Created {}", created.path.display()));
    output.print(&created)
}
