//! Check command for workspace health.

use crate::cli::args::{CheckArgs, CheckFormat};
use crate::cli::output::Output;
use crate::error::{DocError, ExitCode, Result};
use crate::health::{CheckSummary, HealthChecker, Issue, IssueType, compute_summary, format_github_actions};
use crate::workspace::Workspace;
use serde::Serialize;

/// Output for check command.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub issues: Vec<Issue>,
    pub summary: CheckSummary,
}

fn parse_types(names: &[String]) -> Result<Vec<IssueType>> {
    names
        .iter()
        .map(|name| {
            IssueType::from_str(name).ok_or_else(|| {
                DocError::UnsupportedOperation(format!("unknown issue type '{}'", name))
            })
        })
        .collect()
}

/// Run checks. Fails with `CheckIssuesFound` when any issue is found, or
/// only for the `--fail-on` types when given.
pub fn run(workspace: &Workspace, args: &CheckArgs, output: &Output) -> Result<ExitCode> {
    let only = parse_types(&args.only)?;
    let ignore = parse_types(&args.ignore)?;
    let fail_on = parse_types(&args.fail_on)?;

    let mut checker = HealthChecker::new(workspace).include_archived(args.include_archived);
    if !only.is_empty() {
        checker = checker.only(only);
    }
    if !ignore.is_empty() {
        checker = checker.ignore(ignore);
    }
    if let Some(ref pattern) = args.glob {
        checker = checker.glob(pattern);
    }

    let issues = checker.run()?;
    let summary = compute_summary(&issues);

    match args.format {
        CheckFormat::Json => {
            output.print(&CheckOutput {
                issues: issues.clone(),
                summary,
            })?;
        }
        CheckFormat::Text => {
            if issues.is_empty() {
                output.print_raw("No issues found.");
            } else {
                for issue in &issues {
                    let field = issue
                        .field
                        .as_deref()
                        .map(|f| format!(" ({})", f))
                        .unwrap_or_default();
                    output.print_raw(&format!(
                        "[{}] {}{}\n  {}\n",
                        issue.issue_type,
                        issue.file.display(),
                        field,
                        issue.message
                    ));
                }
                output.print_raw("---");
                output.print_raw(&format!("Total: {} issues", summary.total));
                for (issue_type, count) in &summary.by_type {
                    output.print_raw(&format!("  {}: {}", issue_type, count));
                }
            }
        }
        CheckFormat::Github => {
            print!("{}", format_github_actions(&issues));
        }
    }

    let failing = if fail_on.is_empty() {
        !issues.is_empty()
    } else {
        issues.iter().any(|issue| fail_on.contains(&issue.issue_type))
    };

    Ok(if failing {
        ExitCode::CheckIssuesFound
    } else {
        ExitCode::Success
    })
}
