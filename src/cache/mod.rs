//! Derivative resolver and cache store.
//!
//! Derivatives live at deterministic paths derived from the cache key, so
//! "is it cached" is a single `exists()` check. Builds are serialized
//! per key through a keyed lock table: concurrent requests for the same
//! (source, filter-set) pair collapse into one pipeline execution while
//! requests for different keys proceed in parallel.

pub mod key;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::debug;
use crate::filterset::{FilterSet, UnknownFilterSet, registry};
use crate::intake::SourceImage;
use crate::transform::TransformError;
use crate::utils::mime;

pub use key::CacheKey;

/// Errors surfaced by derivative resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownFilterSet(#[from] UnknownFilterSet),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("failed to write derivative `{path}`")]
    StorageWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A resolved derivative: its cache path, and whether this call built it.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub path: PathBuf,
    pub fresh: bool,
}

impl Derivative {
    /// Read the derivative bytes from the cache store.
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// Filesystem-backed derivative cache with per-key build locks.
pub struct DerivativeCache {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
    builds: AtomicU64,
}

impl DerivativeCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: DashMap::new(),
            builds: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of pipeline executions this cache has performed. Cache hits
    /// do not count; the at-most-one-build-per-key invariant is observable
    /// here.
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Resolve through the global filter-set registry.
    pub fn resolve(
        &self,
        source: &SourceImage,
        filter_name: &str,
    ) -> Result<Derivative, ResolveError> {
        let registry = registry();
        let set = registry.resolve(filter_name)?;
        self.get_or_create(source, set)
    }

    /// Return the cached derivative for (source, set), building it if
    /// absent.
    pub fn get_or_create(
        &self,
        source: &SourceImage,
        set: &FilterSet,
    ) -> Result<Derivative, ResolveError> {
        let key = CacheKey::new(source, &set.name);
        let path = self.derivative_path(source, set, &key);

        // Fast path: cache hit without touching the lock table.
        if path.exists() {
            debug!("resolve"; "cache hit: {}", path.display());
            return Ok(Derivative { path, fresh: false });
        }

        let lock = self.locks.entry(key.fingerprint()).or_default().clone();
        let _guard = lock.lock();

        // A concurrent builder may have finished while we waited; its
        // result is our hit.
        if path.exists() {
            debug!("resolve"; "cache hit after wait: {}", path.display());
            return Ok(Derivative { path, fresh: false });
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        debug!("resolve"; "building {} for `{}`", path.display(), source.name);

        let bytes = set.apply_to(&source.path)?;
        write_atomic(&path, &bytes).map_err(|e| ResolveError::StorageWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        Ok(Derivative { path, fresh: true })
    }

    /// Deterministic cache path: `<root>/<filter>/<stem>.<fp16>.<ext>`.
    fn derivative_path(&self, source: &SourceImage, set: &FilterSet, key: &CacheKey) -> PathBuf {
        let stem = Path::new(&source.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("media");
        let ext = set
            .output_format()
            .map(|f| f.extension())
            .or_else(|| mime::extension_for(source.mime))
            .unwrap_or("bin");

        self.root
            .join(&set.name)
            .join(format!("{stem}.{}.{ext}", key.fingerprint()))
    }
}

/// Write to a temp sibling and rename into place: readers never observe a
/// partial derivative, and a failed build leaves the miss unresolved.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
