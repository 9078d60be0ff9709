//! `[media]` section configuration.
//!
//! Declares the media library directory and the intake admission rules:
//! maximum upload size in bytes and the MIME allowlist.
//!
//! # Example
//!
//! ```toml
//! [media]
//! dir = "media"
//! max_size = 10485760
//! allowed = ["image/png", "image/jpeg", "image/webp"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::utils::{mime, path::resolve_config_dir};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Media library directory (source images live here).
    pub dir: PathBuf,

    /// Maximum admitted file size in bytes.
    pub max_size: u64,

    /// Admitted MIME types.
    pub allowed: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("media"),
            max_size: 10 * 1024 * 1024,
            allowed: vec![
                mime::types::PNG.to_string(),
                mime::types::JPEG.to_string(),
                mime::types::WEBP.to_string(),
            ],
        }
    }
}

impl MediaConfig {
    /// Check a MIME type against the allowlist.
    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed.iter().any(|m| m == mime_type)
    }

    /// Resolve the directory relative to the project root.
    pub fn normalize(&mut self, root: &Path) {
        self.dir = resolve_config_dir(&self.dir, root);
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_size == 0 {
            diag.error("media.max_size", "must be greater than zero");
        }
        if self.allowed.is_empty() {
            diag.error("media.allowed", "at least one MIME type is required");
        }
        for entry in &self.allowed {
            if !mime::is_image(entry) {
                diag.error(
                    "media.allowed",
                    format!("`{entry}`: only image/* types are admitted"),
                );
            } else if mime::extension_for(entry).is_none() {
                diag.error_with_hint(
                    "media.allowed",
                    format!("`{entry}`: no codec available"),
                    "supported types are image/png, image/jpeg and image/webp",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MediaConfig::default();
        assert_eq!(config.dir, PathBuf::from("media"));
        assert_eq!(config.max_size, 10 * 1024 * 1024);
        assert!(config.is_allowed("image/png"));
        assert!(!config.is_allowed("image/gif"));
    }

    #[test]
    fn test_parse_overrides() {
        let config: MediaConfig = toml::from_str(
            r#"
dir = "uploads"
max_size = 1024
allowed = ["image/jpeg"]
"#,
        )
        .unwrap();
        assert_eq!(config.dir, PathBuf::from("uploads"));
        assert_eq!(config.max_size, 1024);
        assert!(config.is_allowed("image/jpeg"));
        assert!(!config.is_allowed("image/png"));
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let config: MediaConfig = toml::from_str(
            r#"
max_size = 0
allowed = ["text/plain", "image/tiff"]
"#,
        )
        .unwrap();
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        // zero max_size + non-image type + unencodable image type
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_normalize_resolves_relative_dir() {
        let mut config = MediaConfig::default();
        config.normalize(Path::new("/project"));
        assert_eq!(config.dir, PathBuf::from("/project/media"));
    }
}
