//! Relation resolution.
//!
//! A relation field stores document ids (file stems) of documents in the
//! directory named by the field's `relationPath`. Resolution matches ids to
//! documents there:
//! 1. Ids and stems are compared after NFC normalization
//! 2. A trailing `.md` on an id is ignored
//! 3. Ids with no match stay in the result, labelled with the id itself

use crate::document::Document;
use crate::index::DirectoryIndex;
use crate::parser::{Scalar, Value};
use crate::schema::FieldDescriptor;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Resolved view of a relation field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    /// The field's `relationPath`, as declared.
    pub path: String,
    pub files: Vec<RelationEntry>,
}

/// One referenced (or candidate) document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationEntry {
    /// Document id as stored in front matter.
    pub value: String,
    /// Title of the target, or the id when it does not resolve.
    pub label: String,
    /// Root-relative path of the target; absent when dangling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl RelationEntry {
    pub fn is_dangling(&self) -> bool {
        self.path.is_none()
    }

    fn dangling(id: String) -> Self {
        Self {
            label: id.clone(),
            value: id,
            path: None,
        }
    }

    fn from_document(doc: &Document) -> Self {
        Self {
            value: doc.name().to_string(),
            label: doc.title.clone(),
            path: Some(doc.path.clone()),
        }
    }
}

/// Resolves relation fields against the directory index.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    index: DirectoryIndex<'a>,
}

impl<'a> RelationResolver<'a> {
    pub fn new(index: DirectoryIndex<'a>) -> Self {
        Self { index }
    }

    /// Directory a relation points at, for a document owned by `owner`.
    ///
    /// `./` and `../` prefixes are relative to `owner`; anything else is
    /// relative to the workspace root.
    pub fn target_dir(relation_path: &str, owner: &Path) -> PathBuf {
        let relative = relation_path.starts_with("./") || relation_path.starts_with("../");
        let joined = if relative {
            owner.join(relation_path)
        } else {
            PathBuf::from(relation_path.trim_start_matches('/'))
        };

        let mut out = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !out.pop() {
                        // Kept so the store rejects it as outside the root.
                        out.push("..");
                    }
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }

    /// Every document in the relation's target directory.
    pub fn options(&self, field: &FieldDescriptor, owner: &Path) -> Relation {
        let relation_path = field.relation_path.clone().unwrap_or_default();
        let files = self
            .candidates(&relation_path, owner)
            .iter()
            .map(RelationEntry::from_document)
            .collect();
        Relation {
            path: relation_path,
            files,
        }
    }

    /// Resolve the ids stored in `value`.
    ///
    /// Never fails: unknown ids, an unreadable target directory and
    /// non-text values all produce dangling entries.
    pub fn resolve(&self, field: &FieldDescriptor, owner: &Path, value: &Value) -> Relation {
        let relation_path = field.relation_path.clone().unwrap_or_default();
        let candidates = self.candidates(&relation_path, owner);

        let files = relation_ids(value)
            .into_iter()
            .map(|id| {
                let key = match_key(&id);
                candidates
                    .iter()
                    .find(|doc| match_key(doc.name()) == key)
                    .map(|doc| RelationEntry {
                        value: id.clone(),
                        label: doc.title.clone(),
                        path: Some(doc.path.clone()),
                    })
                    .unwrap_or_else(|| RelationEntry::dangling(id))
            })
            .collect();

        Relation {
            path: relation_path,
            files,
        }
    }

    fn candidates(&self, relation_path: &str, owner: &Path) -> Vec<Document> {
        let dir = Self::target_dir(relation_path, owner);
        match self.index.list_documents(&dir) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "relation target unavailable");
                Vec::new()
            }
        }
    }
}

/// Ids held by a relation value, in order. Empty ids are skipped.
pub fn relation_ids(value: &Value) -> Vec<String> {
    let scalars: Vec<Scalar> = match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.clone(),
        Value::Bool(b) => vec![Scalar::Bool(*b)],
        Value::Number(n) => vec![Scalar::Number(n.clone())],
        Value::Text(s) => vec![Scalar::Text(s.clone())],
    };

    scalars
        .into_iter()
        .map(|s| match s {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        })
        .filter(|id| !id.trim().is_empty())
        .collect()
}

fn match_key(id: &str) -> String {
    let id = id.trim();
    let id = id.strip_suffix(".md").unwrap_or(id);
    id.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::FieldType;
    use crate::store::FileStore;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore, Config) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("features")).unwrap();
        fs::create_dir_all(temp.path().join("products/app")).unwrap();
        fs::write(
            temp.path().join("features/x.md"),
            "---\ntitle: Feature X\n---\n",
        )
        .unwrap();
        fs::write(temp.path().join("features/caf\u{e9}.md"), "# Café").unwrap();
        let store = FileStore::new(temp.path()).unwrap();
        (temp, store, Config::default())
    }

    fn field() -> FieldDescriptor {
        FieldDescriptor::relation(FieldType::MultiRelation, "features")
    }

    #[test]
    fn test_dangling_ids_keep_their_entry() {
        let (_temp, store, config) = setup();
        let resolver = RelationResolver::new(DirectoryIndex::new(&store, &config));
        let value = Value::List(vec!["x".into(), "y".into()]);

        let relation = resolver.resolve(&field(), Path::new("products/app"), &value);
        assert_eq!(relation.path, "features");
        assert_eq!(
            relation.files,
            vec![
                RelationEntry {
                    value: "x".into(),
                    label: "Feature X".into(),
                    path: Some(PathBuf::from("features/x.md")),
                },
                RelationEntry {
                    value: "y".into(),
                    label: "y".into(),
                    path: None,
                },
            ]
        );
    }

    #[test]
    fn test_nfc_matching() {
        let (_temp, store, config) = setup();
        let resolver = RelationResolver::new(DirectoryIndex::new(&store, &config));
        // Decomposed "e" + combining acute accent.
        let value = Value::from("cafe\u{301}");

        let relation = resolver.resolve(&field(), Path::new(""), &value);
        assert_eq!(relation.files.len(), 1);
        assert_eq!(relation.files[0].label, "Café");
        assert!(!relation.files[0].is_dangling());
    }

    #[test]
    fn test_missing_target_directory() {
        let (_temp, store, config) = setup();
        let resolver = RelationResolver::new(DirectoryIndex::new(&store, &config));
        let field = FieldDescriptor::relation(FieldType::Relation, "nowhere");

        let relation = resolver.resolve(&field, Path::new(""), &Value::from("x"));
        assert!(relation.files[0].is_dangling());
        assert!(resolver.options(&field, Path::new("")).files.is_empty());
    }

    #[test]
    fn test_options_lists_target_documents() {
        let (_temp, store, config) = setup();
        let resolver = RelationResolver::new(DirectoryIndex::new(&store, &config));
        let options = resolver.options(&field(), Path::new("products/app"));
        let values: Vec<_> = options.files.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["caf\u{e9}", "x"]);
    }

    #[test]
    fn test_target_dir() {
        let owner = Path::new("products/app");
        assert_eq!(
            RelationResolver::target_dir("features", owner),
            PathBuf::from("features")
        );
        assert_eq!(
            RelationResolver::target_dir("/features", owner),
            PathBuf::from("features")
        );
        assert_eq!(
            RelationResolver::target_dir("./pages", owner),
            PathBuf::from("products/app/pages")
        );
        assert_eq!(
            RelationResolver::target_dir("../web/pages", owner),
            PathBuf::from("products/web/pages")
        );
        assert_eq!(
            RelationResolver::target_dir("../../../etc", owner),
            PathBuf::from("../etc")
        );
    }

    #[test]
    fn test_relation_ids() {
        assert_eq!(relation_ids(&Value::from("")), Vec::<String>::new());
        assert_eq!(relation_ids(&Value::Null), Vec::<String>::new());
        assert_eq!(
            relation_ids(&Value::List(vec!["a".into(), "".into(), 3.into()])),
            vec!["a".to_string(), "3".to_string()]
        );
    }
}
