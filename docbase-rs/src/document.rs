//! Document representation.

use crate::archive::is_archived;
use crate::error::{DocError, Result};
use crate::parser::{self, FrontMatter, FrontMatterPatch};
use crate::store::FileStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A document: front matter plus body, read from a single file.
///
/// Values are immutable; the `with_*` methods return updated copies whose
/// text keeps every byte the update did not touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Path relative to the workspace root (e.g. "products/app/pages/home.md").
    pub path: PathBuf,

    /// Parsed front matter, `None` when the file has no block.
    pub front_matter: Option<FrontMatter>,

    /// Text after the front-matter block.
    pub body: String,

    /// Display title.
    pub title: String,

    /// Whether the document lives under an archive marker.
    pub archived: bool,

    #[serde(skip)]
    raw: String,
}

impl Document {
    /// Parse a document from its path and full text.
    pub fn parse(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        let path = path.into();
        let raw = raw.into();
        let decoded = parser::decode(&raw);
        let title = derive_title(&path, decoded.data.as_ref(), decoded.body);

        Self {
            archived: is_archived(&path),
            front_matter: decoded.data,
            body: decoded.body.to_string(),
            title,
            path,
            raw,
        }
    }

    /// Load a document through the store.
    ///
    /// Directories and missing paths are both `NotFound`.
    pub fn load(store: &FileStore, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !store.is_file(path)? {
            return Err(DocError::NotFound(path.to_path_buf()));
        }
        let relative = store.relative(path)?;
        let raw = store.read(&relative)?;
        Ok(Self::parse(relative, raw))
    }

    /// Get the document name (file stem).
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    /// Get the containing directory.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    pub fn has_front_matter(&self) -> bool {
        self.front_matter.is_some()
    }

    /// Full text as stored on disk.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Apply a front-matter patch.
    ///
    /// Fails with `MissingFrontMatter` when the document has no block; a
    /// patch never creates one.
    pub fn with_patch(&self, patch: &FrontMatterPatch) -> Result<Self> {
        let raw = parser::update_text(&self.raw, patch)
            .ok_or_else(|| DocError::MissingFrontMatter(self.path.clone()))?;
        Ok(Self::parse(self.path.clone(), raw))
    }

    /// Replace the body, keeping the front-matter block verbatim.
    pub fn with_body(&self, body: &str) -> Self {
        Self::parse(self.path.clone(), parser::replace_body(&self.raw, body))
    }

    /// The same text at a different path.
    pub fn moved_to(&self, path: impl Into<PathBuf>) -> Self {
        Self::parse(path, self.raw.clone())
    }
}

/// Title from front matter, then first H1, then file stem.
fn derive_title(path: &Path, front_matter: Option<&FrontMatter>, body: &str) -> String {
    let from_front_matter = front_matter
        .and_then(|fm| fm.get("title"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(title) = from_front_matter {
        return title.to_string();
    }

    if let Some(heading) = parser::first_h1(body) {
        return heading;
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
