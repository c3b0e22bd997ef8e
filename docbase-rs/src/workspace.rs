//! Workspace facade: the document operations, composed from the store,
//! the directory index, the relation resolver and the archive manager.

use crate::archive::ArchiveManager;
use crate::config::Config;
use crate::document::Document;
use crate::error::{DocError, Result};
use crate::health::{HealthChecker, Issue};
use crate::index::{DirectoryIndex, FileNode, owning_directory};
use crate::parser::{self, FrontMatterPatch};
use crate::relation::{Relation, RelationResolver};
use crate::schema::Schema;
use crate::store::FileStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory contents with metadata and relation candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryView {
    pub path: PathBuf,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    pub files: Vec<Document>,
    pub relations: Vec<FieldRelation>,
}

/// A relation keyed by the schema field it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRelation {
    pub field: String,
    #[serde(flatten)]
    pub relation: Relation,
}

/// Result of [`Workspace::create_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocument {
    pub path: PathBuf,
    pub file_name: String,
}

/// Changes applied by [`Workspace::update_document`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    /// Keys to set; `null` removes a key.
    #[serde(default)]
    pub front_matter_patch: Option<FrontMatterPatch>,
    /// New body text.
    #[serde(default)]
    pub body_replace: Option<String>,
}

impl DocumentUpdate {
    pub fn patch(patch: FrontMatterPatch) -> Self {
        Self {
            front_matter_patch: Some(patch),
            body_replace: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            front_matter_patch: None,
            body_replace: Some(body.into()),
        }
    }
}

/// Result of archive and restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub new_path: PathBuf,
}

/// A documentation workspace rooted at one directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    config: Config,
    store: FileStore,
}

impl Workspace {
    /// Open the workspace at `root` with default configuration.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(root, Config::default())
    }

    /// Open the workspace at `root` with the given configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let store = FileStore::new(root)?;
        tracing::debug!(root = %store.root().display(), "opened workspace");
        Ok(Self { config, store })
    }

    /// Open the workspace a config points at, with an optional root override.
    pub fn open(config: Config, root_override: Option<&Path>) -> Result<Self> {
        let root = config.resolve_root(root_override)?;
        Self::with_config(root, config)
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn index(&self) -> DirectoryIndex<'_> {
        DirectoryIndex::new(&self.store, &self.config)
    }

    pub fn relations(&self) -> RelationResolver<'_> {
        RelationResolver::new(self.index())
    }

    pub fn archive(&self) -> ArchiveManager<'_> {
        ArchiveManager::new(&self.store)
    }

    /// Schema governing a document at `path`, if its directory has one.
    pub fn schema_for_document(&self, path: &Path) -> Option<Schema> {
        self.index().schema_for(owning_directory(path))
    }

    /// Full tree below the root.
    pub fn get_tree(&self) -> Result<Vec<FileNode>> {
        self.index().build_tree()
    }

    /// Directory metadata, documents and relation candidates.
    ///
    /// Paths outside the root are reported as `NotFound`.
    pub fn get_directory(&self, path: impl AsRef<Path>) -> Result<DirectoryView> {
        let path = path.as_ref();
        let dir = match self.store.relative(path) {
            Ok(dir) => dir,
            Err(DocError::PathOutsideRoot(_)) => {
                return Err(DocError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e),
        };
        if !self.store.is_dir(&dir)? {
            return Err(DocError::NotFound(path.to_path_buf()));
        }

        let index = self.index();
        let meta = index.read_directory_meta(&dir).unwrap_or_default();
        let files = index.list_documents(&dir)?;

        let resolver = self.relations();
        let relations = meta
            .schema
            .as_ref()
            .map(|schema| {
                schema
                    .relation_fields()
                    .map(|(name, field)| FieldRelation {
                        field: name.to_string(),
                        relation: resolver.options(field, &dir),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let title = meta.title.unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(DirectoryView {
            path: dir,
            title,
            description: meta.description,
            icon: meta.icon,
            schema: meta.schema,
            files,
            relations,
        })
    }

    /// Read a document.
    pub fn get_document(&self, path: impl AsRef<Path>) -> Result<Document> {
        Document::load(&self.store, path)
    }

    /// Create a new draft in `dir` seeded with the directory's schema defaults.
    ///
    /// The name is the lowest free `draft-NN.md`.
    pub fn create_document(&self, dir: impl AsRef<Path>) -> Result<CreatedDocument> {
        let requested = dir.as_ref();
        let dir = match self.store.relative(requested) {
            Ok(dir) => dir,
            Err(DocError::PathOutsideRoot(_)) => {
                return Err(DocError::NotFound(requested.to_path_buf()));
            }
            Err(e) => return Err(e),
        };
        if !self.store.is_dir(&dir)? {
            return Err(DocError::NotFound(requested.to_path_buf()));
        }

        let front_matter = self
            .index()
            .schema_for(&dir)
            .map(|schema| schema.defaults())
            .unwrap_or_default();
        let text = parser::encode(&front_matter, "");

        let mut n: u32 = 0;
        loop {
            let file_name = format!("{}-{:02}.md", self.config.draft_prefix, n);
            let path = dir.join(&file_name);
            match self.store.create(&path, &text) {
                Ok(()) => return Ok(CreatedDocument { path, file_name }),
                Err(DocError::AlreadyExists(_)) => n += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a front-matter patch and/or a body replacement.
    ///
    /// Patched values are validated against the schema of the document's
    /// directory before anything is written.
    pub fn update_document(
        &self,
        path: impl AsRef<Path>,
        update: &DocumentUpdate,
    ) -> Result<Document> {
        let mut doc = self.get_document(path)?;

        if let Some(ref patch) = update.front_matter_patch {
            if !doc.has_front_matter() {
                return Err(DocError::MissingFrontMatter(doc.path.clone()));
            }
            if let Some(schema) = self.schema_for_document(&doc.path) {
                schema.validate_patch(patch)?;
            }
            doc = doc.with_patch(patch)?;
        }

        if let Some(ref body) = update.body_replace {
            doc = doc.with_body(body);
        }

        self.store.write(&doc.path, doc.raw())?;
        Ok(doc)
    }

    /// Delete a document. Directories are rejected.
    pub fn delete_document(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = self.plan_delete(path)?;
        self.store.delete(path)
    }

    /// Check that `path` can be deleted, without deleting it.
    pub fn plan_delete(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.require_document(path.as_ref())
    }

    /// Move a document to a new path.
    pub fn move_document(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<Document> {
        let (src, dst) = self.plan_move(src, dst)?;
        self.store.move_path(&src, &dst)?;
        self.get_document(dst)
    }

    /// Check that `src` can be moved to `dst`, without moving it.
    ///
    /// Returns both paths relative to the root.
    pub fn plan_move(
        &self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
    ) -> Result<(PathBuf, PathBuf)> {
        let src = self.require_document(src.as_ref())?;
        let dst = self.store.relative(dst)?;
        if self.store.exists(&dst)? {
            return Err(DocError::AlreadyExists(dst));
        }
        Ok((src, dst))
    }

    pub fn archive_document(&self, path: impl AsRef<Path>) -> Result<ArchiveOutcome> {
        let new_path = self.archive().archive(path)?;
        Ok(ArchiveOutcome { new_path })
    }

    pub fn restore_document(&self, path: impl AsRef<Path>) -> Result<ArchiveOutcome> {
        let new_path = self.archive().restore(path)?;
        Ok(ArchiveOutcome { new_path })
    }

    /// Resolve every relation field of a document's schema.
    ///
    /// Fields the document does not set resolve to no entries.
    pub fn resolve_relations(&self, path: impl AsRef<Path>) -> Result<Vec<FieldRelation>> {
        let doc = self.get_document(path)?;
        let Some(schema) = self.schema_for_document(&doc.path) else {
            return Ok(Vec::new());
        };

        let owner = owning_directory(&doc.path);
        let resolver = self.relations();
        let null = parser::Value::Null;
        Ok(schema
            .relation_fields()
            .map(|(name, field)| {
                let value = doc
                    .front_matter
                    .as_ref()
                    .and_then(|fm| fm.get(name))
                    .unwrap_or(&null);
                FieldRelation {
                    field: name.to_string(),
                    relation: resolver.resolve(field, &owner, value),
                }
            })
            .collect())
    }

    /// Health report over all documents, or those matching `pattern`.
    pub fn check(&self, pattern: Option<&str>) -> Result<Vec<Issue>> {
        let mut checker = HealthChecker::new(self);
        if let Some(pattern) = pattern {
            checker = checker.glob(pattern);
        }
        checker.run()
    }

    fn require_document(&self, path: &Path) -> Result<PathBuf> {
        let path = self.store.relative(path)?;
        if self.store.is_dir(&path)? {
            return Err(DocError::UnsupportedOperation(format!(
                "{} is a directory",
                path.display()
            )));
        }
        if !self.store.is_file(&path)? {
            return Err(DocError::NotFound(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Value;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("products/app/pages")).unwrap();
        fs::create_dir_all(root.join("features")).unwrap();
        fs::write(
            root.join("products/app/pages/schema.json"),
            r#"{
                "title": {"type": "text", "required": true},
                "features": {"type": "multi-relation", "relationPath": "features"}
            }"#,
        )
        .unwrap();
        fs::write(
            root.join("products/app/pages/index.md"),
            "---\ntitle: Pages\nicon: file\n---\n",
        )
        .unwrap();
        fs::write(root.join("features/x.md"), "---\ntitle: Feature X\n---\n").unwrap();
        let ws = Workspace::new(root).unwrap();
        (temp, ws)
    }

    #[test]
    fn test_create_read_update() {
        let (_temp, ws) = setup();

        let created = ws.create_document("products/app/pages").unwrap();
        assert_eq!(created.path, PathBuf::from("products/app/pages/draft-00.md"));
        assert_eq!(created.file_name, "draft-00.md");

        let doc = ws.get_document(&created.path).unwrap();
        let fm = doc.front_matter.as_ref().unwrap();
        assert_eq!(fm.get("title"), Some(&Value::from("")));
        assert_eq!(fm.get("features"), Some(&Value::List(vec![])));

        let patch = FrontMatterPatch::new().set("title", "Home").unwrap();
        ws.update_document(&created.path, &DocumentUpdate::patch(patch))
            .unwrap();

        let reread = ws.get_document(&created.path).unwrap();
        assert_eq!(
            reread.front_matter.as_ref().unwrap().get("title"),
            Some(&Value::from("Home"))
        );
        assert_eq!(reread.body, doc.body);
        assert_eq!(reread.title, "Home");
    }

    #[test]
    fn test_create_uses_lowest_free_number() {
        let (temp, ws) = setup();
        let dir = temp.path().join("products/app/pages");
        fs::write(dir.join("draft-00.md"), "").unwrap();
        fs::write(dir.join("draft-02.md"), "").unwrap();

        let created = ws.create_document("products/app/pages").unwrap();
        assert_eq!(created.file_name, "draft-01.md");
    }

    #[test]
    fn test_create_in_missing_directory() {
        let (_temp, ws) = setup();
        assert!(matches!(
            ws.create_document("nope"),
            Err(DocError::NotFound(_))
        ));
        assert!(matches!(
            ws.create_document("../.."),
            Err(DocError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let (_temp, ws) = setup();
        let created = ws.create_document("products/app/pages").unwrap();

        let patch = FrontMatterPatch::new().set("title", 5).unwrap();
        let result = ws.update_document(&created.path, &DocumentUpdate::patch(patch));
        assert!(matches!(
            result,
            Err(DocError::SchemaValidationFailed { .. })
        ));

        let patch = FrontMatterPatch::new().remove("title");
        let result = ws.update_document(&created.path, &DocumentUpdate::patch(patch));
        assert!(matches!(
            result,
            Err(DocError::SchemaValidationFailed { .. })
        ));
    }

    #[test]
    fn test_update_without_front_matter() {
        let (temp, ws) = setup();
        fs::write(temp.path().join("plain.md"), "just text").unwrap();

        let patch = FrontMatterPatch::new().set("a", "b").unwrap();
        let result = ws.update_document("plain.md", &DocumentUpdate::patch(patch));
        assert!(matches!(result, Err(DocError::MissingFrontMatter(_))));

        let doc = ws
            .update_document("plain.md", &DocumentUpdate::body("new text"))
            .unwrap();
        assert_eq!(doc.body, "new text");
        assert_eq!(
            fs::read_to_string(temp.path().join("plain.md")).unwrap(),
            "new text"
        );
    }

    #[test]
    fn test_update_deserializes_from_json() {
        let update: DocumentUpdate = serde_json::from_str(
            r#"{"frontMatterPatch": {"title": "Home", "old": null}, "bodyReplace": "Hi"}"#,
        )
        .unwrap();
        let patch = update.front_matter_patch.unwrap();
        assert_eq!(patch.get("title"), Some(&Some(Value::from("Home"))));
        assert_eq!(patch.get("old"), Some(&None));
        assert_eq!(update.body_replace.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_get_directory() {
        let (_temp, ws) = setup();
        ws.create_document("products/app/pages").unwrap();

        let view = ws.get_directory("products/app/pages").unwrap();
        assert_eq!(view.title, "Pages");
        assert_eq!(view.icon.as_deref(), Some("file"));
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.relations.len(), 1);
        assert_eq!(view.relations[0].field, "features");
        assert_eq!(view.relations[0].relation.files[0].label, "Feature X");

        let view = ws.get_directory("features").unwrap();
        assert_eq!(view.title, "features");
        assert!(view.schema.is_none());

        assert!(matches!(
            ws.get_directory("../elsewhere"),
            Err(DocError::NotFound(_))
        ));
        assert!(matches!(
            ws.get_directory("features/x.md"),
            Err(DocError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_relations() {
        let (temp, ws) = setup();
        fs::write(
            temp.path().join("products/app/pages/home.md"),
            "---\ntitle: Home\nfeatures: [x, y]\n---\n",
        )
        .unwrap();

        let relations = ws.resolve_relations("products/app/pages/home.md").unwrap();
        assert_eq!(relations.len(), 1);
        let files = &relations[0].relation.files;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].label, "Feature X");
        assert_eq!(files[1].label, "y");
        assert!(files[1].path.is_none());
    }

    #[test]
    fn test_delete_and_move() {
        let (temp, ws) = setup();
        let created = ws.create_document("products/app/pages").unwrap();

        assert!(matches!(
            ws.move_document(&created.path, "features/x.md"),
            Err(DocError::AlreadyExists(_))
        ));
        assert!(matches!(
            ws.move_document("features", "moved"),
            Err(DocError::UnsupportedOperation(_))
        ));

        let moved = ws.move_document(&created.path, "features/home.md").unwrap();
        assert_eq!(moved.path, PathBuf::from("features/home.md"));
        assert!(!temp.path().join(&created.path).exists());

        assert!(matches!(
            ws.delete_document("features"),
            Err(DocError::UnsupportedOperation(_))
        ));
        ws.delete_document("features/home.md").unwrap();
        assert!(matches!(
            ws.delete_document("features/home.md"),
            Err(DocError::NotFound(_))
        ));
    }

    #[test]
    fn test_plans_match_real_operations() {
        let (_temp, ws) = setup();

        assert!(matches!(
            ws.plan_move("features", "moved"),
            Err(DocError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            ws.plan_move("features/x.md", "products/app/pages/index.md"),
            Err(DocError::AlreadyExists(_))
        ));
        assert!(matches!(
            ws.plan_delete("features"),
            Err(DocError::UnsupportedOperation(_))
        ));

        let (src, dst) = ws.plan_move("features/x.md", "features/y.md").unwrap();
        assert_eq!(src, PathBuf::from("features/x.md"));
        assert_eq!(dst, PathBuf::from("features/y.md"));
        assert!(ws.get_document("features/x.md").is_ok());
        assert_eq!(ws.plan_delete("features/x.md").unwrap(), PathBuf::from("features/x.md"));
    }

    #[test]
    fn test_archive_and_restore() {
        let (_temp, ws) = setup();
        let outcome = ws.archive_document("features/x.md").unwrap();
        assert_eq!(outcome.new_path, PathBuf::from("features/_/x.md"));
        assert!(ws.get_document(&outcome.new_path).unwrap().archived);

        let outcome = ws.restore_document(&outcome.new_path).unwrap();
        assert_eq!(outcome.new_path, PathBuf::from("features/x.md"));
        assert_eq!(ws.get_document("features/x.md").unwrap().title, "Feature X");
    }
}
