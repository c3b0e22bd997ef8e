//! Get, update and delete commands.

use crate::cli::args::{DeleteArgs, GetArgs, UpdateArgs};
use crate::cli::output::{DryRunResponse, Output};
use crate::error::{DocError, Result};
use crate::parser::{FrontMatterPatch, Value};
use crate::workspace::{DocumentUpdate, Workspace};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub path: String,
    pub message: String,
}

pub fn get(workspace: &Workspace, args: &GetArgs, output: &Output) -> Result<()> {
    let doc = workspace.get_document(&args.path)?;

    if args.body_only {
        output.print_raw(doc.body.trim_end_matches('\n'));
        return Ok(());
    }
    if args.front_matter_only {
        let front_matter = doc
            .front_matter
            .ok_or_else(|| DocError::MissingFrontMatter(doc.path.clone()))?;
        return output.print(&front_matter);
    }

    output.print(&doc)
}

pub fn update(workspace: &Workspace, args: &UpdateArgs, output: &Output) -> Result<()> {
    let update = build_update(args)?;
    if update.front_matter_patch.is_none() && update.body_replace.is_none() {
        return Err(DocError::UnsupportedOperation(
            "nothing to update: pass --set, --remove, --patch, --body or --body-file".to_string(),
        ));
    }

    let doc = workspace.update_document(&args.path, &update)?;
    output.info(&format!("Updated {}", doc.path.display()));
    output.print(&doc)
}

pub fn delete(workspace: &Workspace, args: &DeleteArgs, output: &Output) -> Result<()> {
    if args.dry_run {
        let path = workspace.plan_delete(&args.path)?;
        return output.print(&DryRunResponse {
            action: "delete".to_string(),
            path: path.display().to_string(),
            to: None,
        });
    }

    workspace.delete_document(&args.path)?;
    output.print(&DeleteResponse {
        path: args.path.clone(),
        message: "Document deleted".to_string(),
    })
}

/// Combine `--patch`, `--set`, `--remove` and body flags into one update.
///
/// Later flags win: `--set` overrides `--patch`, `--remove` overrides both.
pub fn build_update(args: &UpdateArgs) -> Result<DocumentUpdate> {
    let mut patch: Option<FrontMatterPatch> = match args.patch {
        Some(ref json) => Some(serde_json::from_str(json)?),
        None => None,
    };

    for pair in &args.set {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            DocError::InvalidFrontMatter(format!("expected KEY=VALUE, got '{}'", pair))
        })?;
        patch = Some(patch.unwrap_or_default().set(key.trim(), parse_value(raw))?);
    }

    for key in &args.remove {
        patch = Some(patch.unwrap_or_default().remove(key.trim()));
    }

    let body_replace = match (&args.body, &args.body_file) {
        (Some(body), _) => Some(body.clone()),
        (None, Some(file)) => Some(std::fs::read_to_string(file)?),
        (None, None) => None,
    };

    Ok(DocumentUpdate {
        front_matter_patch: patch,
        body_replace,
    })
}

/// Parse a `--set` value as JSON, falling back to plain text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::Text(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Scalar;
    use pretty_assertions::assert_eq;

    fn args(set: &[&str], remove: &[&str], patch: Option<&str>) -> UpdateArgs {
        UpdateArgs {
            path: "a.md".to_string(),
            set: set.iter().map(|s| s.to_string()).collect(),
            remove: remove.iter().map(|s| s.to_string()).collect(),
            patch: patch.map(str::to_string),
            body: None,
            body_file: None,
        }
    }

    #[test]
    fn test_set_values_parse_as_json() {
        let update = build_update(&args(&["n=3", "flag=true", "tags=[\"a\",\"b\"]", "title=Home"], &[], None))
            .unwrap();
        let patch = update.front_matter_patch.unwrap();
        assert_eq!(patch.get("n"), Some(&Some(Value::from(3))));
        assert_eq!(patch.get("flag"), Some(&Some(Value::Bool(true))));
        assert_eq!(
            patch.get("tags"),
            Some(&Some(Value::List(vec![Scalar::from("a"), Scalar::from("b")])))
        );
        assert_eq!(patch.get("title"), Some(&Some(Value::from("Home"))));
        assert!(update.body_replace.is_none());
    }

    #[test]
    fn test_remove_overrides_patch() {
        let update = build_update(&args(&[], &["title"], Some(r#"{"title": "x", "a": 1}"#))).unwrap();
        let patch = update.front_matter_patch.unwrap();
        assert_eq!(patch.get("title"), Some(&None));
        assert_eq!(patch.get("a"), Some(&Some(Value::from(1))));
    }

    #[test]
    fn test_set_requires_equals() {
        assert!(matches!(
            build_update(&args(&["title"], &[], None)),
            Err(DocError::InvalidFrontMatter(_))
        ));
    }

    #[test]
    fn test_nothing_to_update() {
        let update = build_update(&args(&[], &[], None)).unwrap();
        assert_eq!(update, DocumentUpdate::default());
    }
}
