//! Directory tree and per-directory metadata.

use crate::config::{ARCHIVE_MARKER, Config};
use crate::document::Document;
use crate::error::{DocError, Result};
use crate::parser;
use crate::schema::Schema;
use crate::store::FileStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Reserved readme name, matched case-insensitively.
pub const README_FILE: &str = "README.md";

/// A node of the workspace tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    File {
        name: String,
        path: PathBuf,
    },
    Directory {
        name: String,
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        children: Vec<FileNode>,
    },
}

impl FileNode {
    pub fn name(&self) -> &str {
        match self {
            FileNode::File { name, .. } | FileNode::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileNode::File { path, .. } | FileNode::Directory { path, .. } => path,
        }
    }

    /// Paths of every file at or below this node, depth-first.
    pub fn file_paths(&self) -> Vec<&Path> {
        match self {
            FileNode::File { path, .. } => vec![path.as_path()],
            FileNode::Directory { children, .. } => {
                children.iter().flat_map(FileNode::file_paths).collect()
            }
        }
    }
}

/// Metadata a directory declares through its index and schema files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Read-only view of the directory structure under the store root.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryIndex<'a> {
    store: &'a FileStore,
    config: &'a Config,
}

impl<'a> DirectoryIndex<'a> {
    pub fn new(store: &'a FileStore, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Whether a directory entry is metadata or hidden rather than content.
    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with('.')
            || name.eq_ignore_ascii_case(README_FILE)
            || name == self.config.index_file
            || name == self.config.schema_file
    }

    /// Build the full tree below the root.
    pub fn build_tree(&self) -> Result<Vec<FileNode>> {
        self.children(Path::new(""))
    }

    fn children(&self, dir: &Path) -> Result<Vec<FileNode>> {
        let mut nodes = Vec::new();
        for name in self.store.list_entries(dir)? {
            if self.is_reserved(&name) {
                continue;
            }
            let path = dir.join(&name);
            let Some(is_dir) = self.inside_root(&path, |p| self.store.is_dir(p))? else {
                continue;
            };
            if is_dir {
                let meta = self.read_directory_meta(&path).unwrap_or_default();
                let children = self.children(&path)?;
                nodes.push(FileNode::Directory {
                    name,
                    path,
                    title: meta.title,
                    icon: meta.icon,
                    children,
                });
            } else {
                nodes.push(FileNode::File { name, path });
            }
        }
        Ok(nodes)
    }

    /// Probe an entry found while listing, skipping it when it links out of
    /// the root.
    fn inside_root(
        &self,
        path: &Path,
        probe: impl Fn(&Path) -> Result<bool>,
    ) -> Result<Option<bool>> {
        match probe(path) {
            Ok(found) => Ok(Some(found)),
            Err(DocError::PathOutsideRoot(_)) => {
                tracing::warn!(path = %path.display(), "skipping entry that leads outside the root");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Title, description, icon and schema of a directory.
    ///
    /// Never fails: missing files mean no metadata, and unparsable ones are
    /// logged and skipped.
    pub fn read_directory_meta(&self, dir: impl AsRef<Path>) -> Option<DirectoryMeta> {
        let dir = dir.as_ref();
        match self.store.is_dir(dir) {
            Ok(true) => {}
            _ => return None,
        }

        let mut meta = DirectoryMeta::default();
        let mut found = false;

        let index_path = dir.join(&self.config.index_file);
        if let Some(text) = self.read_optional(&index_path) {
            match parser::decode(&text).data {
                Some(data) => {
                    found = true;
                    let text_field =
                        |key: &str| data.get(key).and_then(|v| v.as_str()).map(str::to_string);
                    meta.title = text_field("title");
                    meta.description = text_field("description");
                    meta.icon = text_field("icon");
                }
                None => {
                    tracing::warn!(path = %index_path.display(), "index file has no front matter");
                }
            }
        }

        let schema_path = dir.join(&self.config.schema_file);
        if let Some(text) = self.read_optional(&schema_path) {
            match Schema::from_json(&text) {
                Ok(schema) => {
                    found = true;
                    meta.schema = Some(schema);
                }
                Err(e) => {
                    tracing::warn!(path = %schema_path.display(), error = %e, "ignoring invalid schema");
                }
            }
        }

        found.then_some(meta)
    }

    fn read_optional(&self, path: &Path) -> Option<String> {
        match self.store.is_file(path) {
            Ok(true) => {}
            _ => return None,
        }
        match self.store.read(path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable metadata file");
                None
            }
        }
    }

    /// Schema governing documents of `dir`, if any.
    pub fn schema_for(&self, dir: impl AsRef<Path>) -> Option<Schema> {
        self.read_directory_meta(dir).and_then(|meta| meta.schema)
    }

    /// Paths of the documents directly inside `dir`, sorted by name.
    pub fn document_paths(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !self.store.is_dir(dir)? {
            return Err(DocError::NotFound(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for name in self.store.list_entries(dir)? {
            if self.is_reserved(&name) || !is_document_name(&name) {
                continue;
            }
            let path = dir.join(&name);
            if self.inside_root(&path, |p| self.store.is_file(p))? == Some(true) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Documents directly inside `dir`, sorted by name.
    pub fn list_documents(&self, dir: impl AsRef<Path>) -> Result<Vec<Document>> {
        self.document_paths(dir)?
            .into_iter()
            .map(|path| Document::load(self.store, path))
            .collect()
    }

    /// Every document path in the workspace, depth-first.
    pub fn walk_documents(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for node in self.build_tree()? {
            for path in node.file_paths() {
                if path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_document_name)
                {
                    paths.push(path.to_path_buf());
                }
            }
        }
        Ok(paths)
    }
}

/// Markdown files are documents; other files only appear in the tree.
pub fn is_document_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// The collection a document belongs to.
///
/// Archived documents keep the directory above their archive marker.
pub fn owning_directory(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    match parent.file_name() {
        Some(name) if name == ARCHIVE_MARKER => {
            parent.parent().unwrap_or(Path::new("")).to_path_buf()
        }
        _ => parent.to_path_buf(),
    }
}
