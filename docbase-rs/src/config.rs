//! Workspace configuration.
//!
//! Configuration is read once from `<config dir>/docbase/config.toml` and the
//! resulting [`Config`] is handed to [`crate::Workspace`], which threads the
//! root and the reserved names into every component.

use crate::error::{DocError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured root.
pub const ROOT_ENV_VAR: &str = "DOCBASE_ROOT";

/// Reserved directory segment marking archived documents.
pub const ARCHIVE_MARKER: &str = "_";

/// Workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default workspace root.
    pub root: Option<PathBuf>,
    /// File name of the per-directory metadata file.
    pub index_file: String,
    /// File name of the per-directory schema file.
    pub schema_file: String,
    /// Stem prefix for generated document names.
    pub draft_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            index_file: "index.md".to_string(),
            schema_file: "schema.json".to_string(),
            draft_prefix: "draft".to_string(),
        }
    }
}

impl Config {
    /// Location of the user config file, if a config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docbase").join("config.toml"))
    }

    /// Load the user config, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.check()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Resolve the workspace root.
    ///
    /// Order: explicit override, `DOCBASE_ROOT`, configured root, current directory.
    pub fn resolve_root(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        let root = if let Some(path) = override_path {
            path.to_path_buf()
        } else if let Some(env) = std::env::var_os(ROOT_ENV_VAR) {
            PathBuf::from(env)
        } else if let Some(ref root) = self.root {
            root.clone()
        } else {
            std::env::current_dir()?
        };

        if !root.is_dir() {
            return Err(DocError::RootNotFound(root));
        }
        Ok(root)
    }

    fn check(&self) -> Result<()> {
        for (key, name) in [
            ("index_file", &self.index_file),
            ("schema_file", &self.schema_file),
        ] {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(DocError::ConfigError(format!(
                    "{} must be a plain file name, got {:?}",
                    key, name
                )));
            }
        }
        if self.draft_prefix.is_empty() || self.draft_prefix.contains('/') {
            return Err(DocError::ConfigError(format!(
                "draft_prefix must be a non-empty name, got {:?}",
                self.draft_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.index_file, "index.md");
        assert_eq!(config.schema_file, "schema.json");
        assert_eq!(config.draft_prefix, "draft");
        assert!(config.root.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "index_file = \"_index.md\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.index_file, "_index.md");
        assert_eq!(config.schema_file, "schema.json");
    }

    #[test]
    fn test_load_rejects_nested_index_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "index_file = \"meta/index.md\"\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(DocError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_root_override() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let root = config.resolve_root(Some(dir.path())).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn test_resolve_root_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = Config::default().resolve_root(Some(&missing));
        assert!(matches!(result, Err(DocError::RootNotFound(_))));
    }
}
