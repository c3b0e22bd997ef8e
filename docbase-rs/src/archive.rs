//! Archive convention: archived documents live in a `_` directory next to
//! where they used to be.

use crate::config::ARCHIVE_MARKER;
use crate::error::{DocError, Result};
use crate::store::FileStore;
use std::path::{Path, PathBuf};

/// Whether any segment of `path` is the archive marker.
pub fn is_archived(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == ARCHIVE_MARKER)
}

/// Moves documents in and out of archive marker directories.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveManager<'a> {
    store: &'a FileStore,
}

impl<'a> ArchiveManager<'a> {
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Path a document would be archived to: `a/b/doc.md` -> `a/b/_/doc.md`.
    pub fn archived_path(path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| DocError::NotFound(path.to_path_buf()))?;
        let parent = path.parent().unwrap_or(Path::new(""));
        Ok(parent.join(ARCHIVE_MARKER).join(name))
    }

    /// Path a document would be restored to: `a/b/_/doc.md` -> `a/b/doc.md`.
    pub fn restored_path(path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| DocError::NotFound(path.to_path_buf()))?;
        let parent = path.parent().unwrap_or(Path::new(""));
        if parent.file_name().is_none_or(|n| n != ARCHIVE_MARKER) {
            return Err(DocError::UnsupportedOperation(format!(
                "{} is not directly inside an archive directory",
                path.display()
            )));
        }
        let grandparent = parent.parent().unwrap_or(Path::new(""));
        Ok(grandparent.join(name))
    }

    /// Archive a document, returning its new path.
    ///
    /// Directories and documents that are already archived are rejected.
    pub fn archive(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.store.relative(path)?;
        self.ensure_file(&path)?;
        if is_archived(&path) {
            return Err(DocError::UnsupportedOperation(format!(
                "{} is already archived",
                path.display()
            )));
        }

        let target = Self::archived_path(&path)?;
        self.store.move_path(&path, &target)?;
        tracing::info!(from = %path.display(), to = %target.display(), "archived");
        Ok(target)
    }

    /// Restore an archived document, returning its new path.
    ///
    /// The marker directory is removed when the restore leaves it empty.
    pub fn restore(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.store.relative(path)?;
        self.ensure_file(&path)?;

        let target = Self::restored_path(&path)?;
        if is_archived(&target) {
            return Err(DocError::UnsupportedOperation(format!(
                "{} is inside a nested archive",
                path.display()
            )));
        }
        self.store.move_path(&path, &target)?;

        if let Some(marker) = path.parent() {
            if self.store.list_entries(marker)?.is_empty() {
                self.store.delete(marker)?;
            }
        }
        tracing::info!(from = %path.display(), to = %target.display(), "restored");
        Ok(target)
    }

    fn ensure_file(&self, path: &Path) -> Result<()> {
        if self.store.is_dir(path)? {
            return Err(DocError::UnsupportedOperation(format!(
                "{} is a directory; only documents can be archived or restored",
                path.display()
            )));
        }
        if !self.store.is_file(path)? {
            return Err(DocError::NotFound(path.to_path_buf()));
        }
        Ok(())
    }
}
