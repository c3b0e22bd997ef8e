//! Sandboxed filesystem primitives.
//!
//! Every path handed to [`FileStore`] is interpreted relative to the workspace
//! root and rejected with [`DocError::PathOutsideRoot`] when it resolves
//! anywhere else. There is no other sandbox boundary, so no method touches the
//! filesystem before [`FileStore::resolve`] has accepted its path.

use crate::error::{DocError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Dangling symlink chains longer than this are rejected.
const MAX_LINK_DEPTH: usize = 40;

/// Filesystem access confined to a single root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DocError::RootNotFound(root));
        }
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// Canonical absolute root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-relative path to an absolute path inside the root.
    ///
    /// Resolution is lexical so that paths which do not exist yet are checked
    /// too. The nearest existing ancestor is then canonicalized to catch
    /// symlinks pointing out of the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(DocError::PathOutsideRoot(path.to_path_buf()));
        }

        if !self.stays_inside(&normalized, MAX_LINK_DEPTH) {
            return Err(DocError::PathOutsideRoot(path.to_path_buf()));
        }

        Ok(normalized)
    }

    /// Whether the nearest existing ancestor of `path` really lies in the root.
    ///
    /// Dangling symlinks cannot be canonicalized, so their targets are followed
    /// by hand. Anything that cannot be resolved counts as outside.
    fn stays_inside(&self, path: &Path, depth: usize) -> bool {
        let mut existing = path;
        while fs::symlink_metadata(existing).is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return false,
            }
        }

        if let Ok(real) = existing.canonicalize() {
            return real.starts_with(&self.root);
        }
        if depth == 0 {
            return false;
        }

        let Ok(target) = fs::read_link(existing) else {
            return false;
        };
        let target = if target.is_absolute() {
            target
        } else {
            match existing.parent().and_then(|p| p.canonicalize().ok()) {
                Some(base) => base.join(target),
                None => return false,
            }
        };
        let target = normalize(&target);
        target.starts_with(&self.root) && self.stays_inside(&target, depth - 1)
    }

    /// Root-relative form of a path, after sandbox checks.
    pub fn relative(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = self.resolve(path)?;
        Ok(absolute
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default())
    }

    /// Read a file as UTF-8 text.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(DocError::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "read");
        Ok(fs::read_to_string(full)?)
    }

    /// Write text to a file, creating parent directories as needed.
    pub fn write(&self, path: impl AsRef<Path>, text: &str) -> Result<()> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(DocError::UnsupportedOperation(format!(
                "cannot write to directory {}",
                path.display()
            )));
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, text)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "write");
        Ok(())
    }

    /// Create a new file, failing with `AlreadyExists` if the path is taken.
    pub fn create(&self, path: impl AsRef<Path>, text: &str) -> Result<()> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DocError::AlreadyExists(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(text.as_bytes())?;
        tracing::info!(path = %path.display(), "created");
        Ok(())
    }

    /// Check whether a file or directory exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.resolve(path)?.exists())
    }

    /// Check whether a path is an existing directory.
    pub fn is_dir(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.resolve(path)?.is_dir())
    }

    /// Check whether a path is an existing regular file.
    pub fn is_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    /// Create a directory and its parents.
    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(full)?;
        Ok(())
    }

    /// Names of the direct entries of a directory, sorted ascending.
    pub fn list_entries(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        if !full.is_dir() {
            return Err(DocError::NotFound(path.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Move a file or directory.
    ///
    /// Files are renamed. Directories are copied recursively and the source
    /// is deleted afterwards; if the delete fails both copies remain on disk.
    /// Missing sources and occupied destinations fail before any mutation.
    pub fn move_path(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        let src_full = self.resolve(src)?;
        let dst_full = self.resolve(dst)?;

        if !src_full.exists() {
            return Err(DocError::NotFound(src.to_path_buf()));
        }
        if dst_full.exists() {
            return Err(DocError::AlreadyExists(dst.to_path_buf()));
        }
        if src_full == self.root {
            return Err(DocError::UnsupportedOperation(
                "cannot move the workspace root".to_string(),
            ));
        }

        if src_full.is_dir() && dst_full.starts_with(&src_full) {
            return Err(DocError::UnsupportedOperation(format!(
                "cannot move {} into itself",
                src.display()
            )));
        }

        if let Some(parent) = dst_full.parent() {
            fs::create_dir_all(parent)?;
        }

        if src_full.is_dir() {
            copy_dir_recursive(&src_full, &dst_full)?;
            fs::remove_dir_all(&src_full)?;
        } else {
            fs::rename(&src_full, &dst_full)?;
        }

        tracing::info!(from = %src.display(), to = %dst.display(), "moved");
        Ok(())
    }

    /// Delete a file, or a directory with its contents.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(DocError::UnsupportedOperation(
                "cannot delete the workspace root".to_string(),
            ));
        }

        match fs::symlink_metadata(&full) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DocError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&full)?,
            Ok(_) => fs::remove_file(&full)?,
        }

        tracing::info!(path = %path.display(), "deleted");
        Ok(())
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let (_dir, store) = setup_store();
        store.write("a/b/note.md", "hello").unwrap();
        assert_eq!(store.read("a/b/note.md").unwrap(), "hello");
        assert!(store.is_dir("a/b").unwrap());
    }

    #[test]
    fn test_create_is_exclusive() {
        let (_dir, store) = setup_store();
        store.create("new/doc.md", "first").unwrap();
        let result = store.create("new/doc.md", "second");
        assert!(matches!(result, Err(DocError::AlreadyExists(_))));
        assert_eq!(store.read("new/doc.md").unwrap(), "first");
    }

    #[test]
    fn test_parent_escape_rejected() {
        let (_dir, store) = setup_store();
        let result = store.read("../outside.md");
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));

        let result = store.write("docs/../../outside.md", "x");
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));
    }

    #[test]
    fn test_inner_parent_segments_allowed() {
        let (_dir, store) = setup_store();
        store.write("docs/a.md", "A").unwrap();
        assert_eq!(store.read("docs/sub/../a.md").unwrap(), "A");
    }

    #[test]
    fn test_absolute_path_outside_rejected() {
        let (_dir, store) = setup_store();
        let other = TempDir::new().unwrap();
        let result = store.exists(other.path().join("x.md"));
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));
    }

    #[test]
    fn test_nested_root_read() {
        let (dir, _store) = setup_store();
        std::fs::create_dir_all(dir.path().join("docs/docs")).unwrap();
        std::fs::write(dir.path().join("docs/docs/a.md"), "nested").unwrap();

        let store = FileStore::new(dir.path().join("docs")).unwrap();
        assert_eq!(store.read("docs/a.md").unwrap(), "nested");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, store) = setup_store();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.md"), "s").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let result = store.read("link/secret.md");
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_escape_rejected() {
        let (dir, store) = setup_store();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("pwned.md");
        std::os::unix::fs::symlink(&target, dir.path().join("evil.md")).unwrap();

        let result = store.write("evil.md", "escaped");
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));
        assert!(!target.exists());

        let result = store.create("evil.md", "escaped");
        assert!(matches!(result, Err(DocError::PathOutsideRoot(_))));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_inside_root_allowed() {
        let (dir, store) = setup_store();
        std::os::unix::fs::symlink("later.md", dir.path().join("alias.md")).unwrap();

        store.write("alias.md", "kept").unwrap();
        assert_eq!(store.read("later.md").unwrap(), "kept");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (_dir, store) = setup_store();
        assert!(matches!(store.read("nope.md"), Err(DocError::NotFound(_))));
    }

    #[test]
    fn test_list_entries_sorted() {
        let (_dir, store) = setup_store();
        store.write("b.md", "").unwrap();
        store.write("a.md", "").unwrap();
        store.create_dir_all("c").unwrap();
        assert_eq!(store.list_entries("").unwrap(), vec!["a.md", "b.md", "c"]);
    }

    #[test]
    fn test_move_file() {
        let (_dir, store) = setup_store();
        store.write("a.md", "A").unwrap();
        store.move_path("a.md", "sub/b.md").unwrap();
        assert!(!store.exists("a.md").unwrap());
        assert_eq!(store.read("sub/b.md").unwrap(), "A");
    }

    #[test]
    fn test_move_directory_copies_then_deletes() {
        let (_dir, store) = setup_store();
        store.write("src/one.md", "1").unwrap();
        store.write("src/deep/two.md", "2").unwrap();

        store.move_path("src", "dst").unwrap();
        assert!(!store.exists("src").unwrap());
        assert_eq!(store.read("dst/one.md").unwrap(), "1");
        assert_eq!(store.read("dst/deep/two.md").unwrap(), "2");
    }

    #[test]
    fn test_move_directory_to_existing_fails_without_mutation() {
        let (_dir, store) = setup_store();
        store.write("src/one.md", "1").unwrap();
        store.write("dst/other.md", "o").unwrap();

        let result = store.move_path("src", "dst");
        assert!(matches!(result, Err(DocError::AlreadyExists(_))));
        assert!(store.exists("src/one.md").unwrap());
        assert!(!store.exists("dst/one.md").unwrap());
    }

    #[test]
    fn test_move_missing_source() {
        let (_dir, store) = setup_store();
        let result = store.move_path("ghost", "dst");
        assert!(matches!(result, Err(DocError::NotFound(_))));
        assert!(!store.exists("dst").unwrap());
    }

    #[test]
    fn test_move_directory_into_itself() {
        let (_dir, store) = setup_store();
        store.write("src/one.md", "1").unwrap();
        let result = store.move_path("src", "src/inner");
        assert!(matches!(result, Err(DocError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_delete_file_and_directory() {
        let (_dir, store) = setup_store();
        store.write("a.md", "A").unwrap();
        store.write("d/b.md", "B").unwrap();

        store.delete("a.md").unwrap();
        store.delete("d").unwrap();
        assert!(!store.exists("a.md").unwrap());
        assert!(!store.exists("d").unwrap());
        assert!(matches!(store.delete("a.md"), Err(DocError::NotFound(_))));
    }

    #[test]
    fn test_delete_root_refused() {
        let (_dir, store) = setup_store();
        let result = store.delete("sub/..");
        assert!(matches!(result, Err(DocError::UnsupportedOperation(_))));
    }
}
