//! Workspace health checks: schema conformance and broken relations.

use crate::document::Document;
use crate::error::Result;
use crate::index::{FileNode, owning_directory};
use crate::relation::relation_ids;
use crate::schema::{Schema, ViolationKind};
use crate::workspace::Workspace;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Types of issues that can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    MissingFrontMatter,
    MissingRequired,
    TypeMismatch,
    BrokenRelation,
    InvalidSchema,
}

impl IssueType {
    /// All issue types.
    pub fn all() -> &'static [IssueType] {
        &[
            IssueType::MissingFrontMatter,
            IssueType::MissingRequired,
            IssueType::TypeMismatch,
            IssueType::BrokenRelation,
            IssueType::InvalidSchema,
        ]
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<IssueType> {
        match s {
            "missing-front-matter" => Some(IssueType::MissingFrontMatter),
            "missing-required" => Some(IssueType::MissingRequired),
            "type-mismatch" => Some(IssueType::TypeMismatch),
            "broken-relation" => Some(IssueType::BrokenRelation),
            "invalid-schema" => Some(IssueType::InvalidSchema),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::MissingFrontMatter => write!(f, "missing-front-matter"),
            IssueType::MissingRequired => write!(f, "missing-required"),
            IssueType::TypeMismatch => write!(f, "type-mismatch"),
            IssueType::BrokenRelation => write!(f, "broken-relation"),
            IssueType::InvalidSchema => write!(f, "invalid-schema"),
        }
    }
}

impl From<ViolationKind> for IssueType {
    fn from(kind: ViolationKind) -> Self {
        match kind {
            ViolationKind::MissingRequired => IssueType::MissingRequired,
            ViolationKind::TypeMismatch => IssueType::TypeMismatch,
        }
    }
}

/// A detected issue in the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Summary of check results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Run health checks on the workspace.
pub struct HealthChecker<'a> {
    workspace: &'a Workspace,
    include_types: Option<HashSet<IssueType>>,
    exclude_types: HashSet<IssueType>,
    glob_pattern: Option<String>,
    include_archived: bool,
}

impl<'a> HealthChecker<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self {
            workspace,
            include_types: None,
            exclude_types: HashSet::new(),
            glob_pattern: None,
            include_archived: false,
        }
    }

    /// Only check specific issue types.
    pub fn only(mut self, types: Vec<IssueType>) -> Self {
        self.include_types = Some(types.into_iter().collect());
        self
    }

    /// Exclude specific issue types.
    pub fn ignore(mut self, types: Vec<IssueType>) -> Self {
        self.exclude_types = types.into_iter().collect();
        self
    }

    /// Only check documents whose root-relative path matches `pattern`.
    pub fn glob(mut self, pattern: &str) -> Self {
        self.glob_pattern = Some(pattern.to_string());
        self
    }

    /// Also check archived documents.
    pub fn include_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }

    fn should_check(&self, issue_type: IssueType) -> bool {
        if self.exclude_types.contains(&issue_type) {
            return false;
        }
        if let Some(ref include) = self.include_types {
            return include.contains(&issue_type);
        }
        true
    }

    /// Run all enabled checks and return issues.
    pub fn run(&self) -> Result<Vec<Issue>> {
        let pattern = self.glob_pattern.as_deref().map(Pattern::new).transpose()?;
        let selected = |path: &Path| pattern.as_ref().is_none_or(|p| p.matches_path(path));

        let index = self.workspace.index();
        let mut issues = Vec::new();

        if self.should_check(IssueType::InvalidSchema) {
            let schema_file = &self.workspace.config().schema_file;
            for dir in directories(&index.build_tree()?) {
                let path = dir.join(schema_file);
                if !selected(&path) || !self.workspace.store().is_file(&path)? {
                    continue;
                }
                let text = self.workspace.store().read(&path)?;
                if let Err(e) = Schema::from_json(&text) {
                    issues.push(Issue {
                        issue_type: IssueType::InvalidSchema,
                        file: path,
                        field: None,
                        message: format!("Schema cannot be parsed: {}", e),
                        target: None,
                    });
                }
            }
        }

        let mut schemas: HashMap<PathBuf, Option<Schema>> = HashMap::new();
        for path in index.walk_documents()? {
            if !selected(&path) {
                continue;
            }
            let doc = Document::load(self.workspace.store(), &path)?;
            if doc.archived && !self.include_archived {
                continue;
            }

            let owner = owning_directory(&doc.path);
            let schema = schemas
                .entry(owner.clone())
                .or_insert_with(|| index.schema_for(&owner));
            if let Some(schema) = schema {
                self.check_document(&doc, &owner, schema, &mut issues);
            }
        }

        tracing::debug!(issues = issues.len(), "health check finished");
        Ok(issues)
    }

    fn check_document(&self, doc: &Document, owner: &Path, schema: &Schema, issues: &mut Vec<Issue>) {
        let Some(ref front_matter) = doc.front_matter else {
            if self.should_check(IssueType::MissingFrontMatter) {
                issues.push(Issue {
                    issue_type: IssueType::MissingFrontMatter,
                    file: doc.path.clone(),
                    field: None,
                    message: "Document has no front matter but its directory has a schema"
                        .to_string(),
                    target: None,
                });
            }
            return;
        };

        for violation in schema.validate_front_matter(front_matter) {
            let issue_type = IssueType::from(violation.kind);
            if self.should_check(issue_type) {
                issues.push(Issue {
                    issue_type,
                    file: doc.path.clone(),
                    field: Some(violation.field),
                    message: violation.message,
                    target: None,
                });
            }
        }

        if !self.should_check(IssueType::BrokenRelation) {
            return;
        }
        let resolver = self.workspace.relations();
        for (name, field) in schema.relation_fields() {
            let Some(value) = front_matter.get(name) else { continue };
            if relation_ids(value).is_empty() {
                continue;
            }
            let relation = resolver.resolve(field, owner, value);
            for entry in relation.files.iter().filter(|e| e.is_dangling()) {
                issues.push(Issue {
                    issue_type: IssueType::BrokenRelation,
                    file: doc.path.clone(),
                    field: Some(name.to_string()),
                    message: format!(
                        "'{}' references '{}', which is not a document in {}",
                        name, entry.value, relation.path
                    ),
                    target: Some(entry.value.clone()),
                });
            }
        }
    }
}

/// Root and every directory below it, depth-first.
fn directories(tree: &[FileNode]) -> Vec<PathBuf> {
    fn walk(nodes: &[FileNode], out: &mut Vec<PathBuf>) {
        for node in nodes {
            if let FileNode::Directory { path, children, .. } = node {
                out.push(path.clone());
                walk(children, out);
            }
        }
    }

    let mut out = vec![PathBuf::new()];
    walk(tree, &mut out);
    out
}

/// Compute summary from issues.
pub fn compute_summary(issues: &[Issue]) -> CheckSummary {
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for issue in issues {
        *by_type.entry(issue.issue_type.to_string()).or_insert(0) += 1;
    }

    CheckSummary {
        total: issues.len(),
        by_type,
    }
}

/// Format issues as GitHub Actions annotations.
pub fn format_github_actions(issues: &[Issue]) -> String {
    let mut output = String::new();

    for issue in issues {
        let level = match issue.issue_type {
            IssueType::BrokenRelation | IssueType::MissingFrontMatter => "warning",
            _ => "error",
        };
        output.push_str(&format!(
            "::{} file={}::{}\n",
            level,
            issue.file.display(),
            issue.message
        ));
    }

    output
}
