//! Project configuration management for `imagemill.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `[media]`    | Media library dir, intake size/MIME rules      |
//! | `[cache]`    | Derivative cache directory                     |
//! | `[[filter]]` | Named filter sets (ordered steps + encoding)   |

mod error;
pub mod section;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{CacheConfig, MediaConfig};

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::filterset::FilterSet;
use crate::utils::path::normalize_path;

/// Root configuration structure representing imagemill.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Media library and intake settings
    pub media: MediaConfig,

    /// Derivative cache settings
    pub cache: CacheConfig,

    /// Declared filter sets, in declaration order
    #[serde(rename = "filter")]
    pub filters: Vec<FilterSet>,
}

impl AppConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file; the project root
    /// is the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let config_path = find_config_file(&cli.config)
            .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;

        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without normalization or validation.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve configured directories against the project root.
    fn normalize(&mut self) {
        let root = self.root.clone();
        self.media.normalize(&root);
        self.cache.normalize(&root);
    }

    /// Validate all sections, collecting diagnostics.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.media.validate(&mut diag);
        self.cache.validate(&mut diag);

        if self.filters.is_empty() {
            diag.error_with_hint(
                "filter",
                "no filter sets declared",
                "add a [[filter]] table with a name and steps",
            );
        }

        let mut seen = FxHashSet::default();
        for set in &self.filters {
            set.validate(&mut diag);
            if !seen.insert(set.name.as_str()) {
                diag.error(
                    "filter.name",
                    format!("duplicate filter set `{}`", set.name),
                );
            }
        }

        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

/// Search for the config file: absolute paths are taken as-is, otherwise
/// walk upward from the current directory.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.exists().then(|| name.to_path_buf());
    }

    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Some(normalize_path(&candidate));
        }
        if !dir.pop() {
            return None;
        }
    }
}
