//! Path normalization utilities.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand `~` and normalize a configured directory path against a root.
///
/// Relative paths are resolved under `root`, absolute and tilde paths
/// are taken as-is.
pub fn resolve_config_dir(raw: &Path, root: &Path) -> PathBuf {
    let expanded = raw
        .to_str()
        .map(|s| PathBuf::from(shellexpand::tilde(s).into_owned()))
        .unwrap_or_else(|| raw.to_path_buf());

    if expanded.is_absolute() {
        expanded
    } else {
        normalize_path(&root.join(expanded))
    }
}
