//! `[cache]` section configuration.
//!
//! The derivative cache directory. Growth is unbounded by design: stale
//! derivatives of replaced sources are orphaned and left to external
//! garbage collection.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! dir = "media/cache"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::utils::path::resolve_config_dir;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Derivative cache directory.
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("media/cache"),
        }
    }
}

impl CacheConfig {
    /// Resolve the directory relative to the project root.
    pub fn normalize(&mut self, root: &Path) {
        self.dir = resolve_config_dir(&self.dir, root);
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.exists() && !self.dir.is_dir() {
            diag.error(
                "cache.dir",
                format!("`{}` must be a directory", self.dir.display()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir() {
        assert_eq!(CacheConfig::default().dir, PathBuf::from("media/cache"));
    }

    #[test]
    fn test_validate_rejects_file_as_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("cache");
        std::fs::write(&file, b"x").unwrap();

        let config = CacheConfig { dir: file };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
