//! Move, archive and restore commands.

use crate::cli::args::{MoveArgs, PathArgs};
use crate::cli::output::{DryRunResponse, Output};
use crate::error::Result;
use crate::workspace::Workspace;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub from: PathBuf,
    pub to: PathBuf,
}

pub fn move_document(workspace: &Workspace, args: &MoveArgs, output: &Output) -> Result<()> {
    if args.dry_run {
        let (from, to) = workspace.plan_move(&args.from, &args.to)?;
        return output.print(&DryRunResponse {
            action: "move".to_string(),
            path: from.display().to_string(),
            to: Some(to.display().to_string()),
        });
    }

    let doc = workspace.move_document(&args.from, &args.to)?;
    output.info(&format!("Moved {} -> {}", args.from, doc.path.display()));
    output.print(&MoveResponse {
        from: PathBuf::from(&args.from),
        to: doc.path,
    })
}

pub fn archive(workspace: &Workspace, args: &PathArgs, output: &Output) -> Result<()> {
    let outcome = workspace.archive_document(&args.path)?;
    output.print(&outcome)
}

pub fn restore(workspace: &Workspace, args: &PathArgs, output: &Output) -> Result<()> {
    let outcome = workspace.restore_document(&args.path)?;
    output.print(&outcome)
}
