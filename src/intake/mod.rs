//! Upload intake: validation, stable naming and admission into the media
//! library.
//!
//! Intake is the producer of source-image identity for the derivative
//! resolver. A file is admitted only after passing the size limit and the
//! MIME allowlist, with the extension cross-checked against sniffed
//! content; everything downstream trusts admitted records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;
use thiserror::Error;

use crate::config::MediaConfig;
use crate::debug;
use crate::utils::{hash, mime};

/// Intake errors. `ValidationFailed` covers every admission rule; it is
/// never retried.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("validation failed for `{path}`: {reason}")]
    ValidationFailed { path: PathBuf, reason: String },

    #[error("no admitted media named `{0}`")]
    NotFound(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),
}

/// An admitted source image.
///
/// Immutable once stored except on explicit replace; `modified` is the
/// cache-invalidation signal consumed by the derivative resolver.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Stable unique name within the media directory.
    pub name: String,
    /// Absolute path in the media directory.
    pub path: PathBuf,
    /// Size in bytes.
    pub len: u64,
    /// Admitted MIME type.
    pub mime: &'static str,
    /// Last-modified timestamp.
    pub modified: SystemTime,
}

/// Validate a file and store it in the media directory.
///
/// The assigned name is `<slug>-<fp8>.<ext>`: a slug of the original stem
/// plus an 8-char content fingerprint, so re-admitting identical content is
/// idempotent while replacements get distinct names.
pub fn admit(src: &Path, config: &MediaConfig) -> Result<SourceImage, IntakeError> {
    let meta = fs::metadata(src).map_err(|e| IntakeError::Io(src.to_path_buf(), e))?;
    if !meta.is_file() {
        return Err(validation(src, "not a regular file"));
    }
    if meta.len() > config.max_size {
        return Err(validation(
            src,
            format!(
                "size {} exceeds the {} byte limit",
                meta.len(),
                config.max_size
            ),
        ));
    }

    let declared = mime::from_path(src);
    if !config.is_allowed(declared) {
        return Err(validation(
            src,
            format!("MIME type `{declared}` is not in the allowlist"),
        ));
    }

    let bytes = fs::read(src).map_err(|e| IntakeError::Io(src.to_path_buf(), e))?;
    match image::guess_format(&bytes)
        .ok()
        .and_then(mime::from_image_format)
    {
        Some(sniffed) if sniffed == declared => {}
        Some(sniffed) => {
            return Err(validation(
                src,
                format!("content is `{sniffed}` but the extension declares `{declared}`"),
            ));
        }
        None => return Err(validation(src, "content is not a recognized image")),
    }

    let name = stable_name(src, &bytes, declared);
    let dest = config.dir.join(&name);

    if dest.exists() {
        debug!("ingest"; "`{}` already admitted as {}", src.display(), name);
    } else {
        store_atomic(&dest, &bytes, &config.dir)
            .map_err(|e| IntakeError::Io(dest.clone(), e))?;
    }

    let stored = fs::metadata(&dest).map_err(|e| IntakeError::Io(dest.clone(), e))?;
    Ok(SourceImage {
        name,
        path: dest,
        len: stored.len(),
        mime: declared,
        modified: stored
            .modified()
            .map_err(|e| IntakeError::Io(config.dir.clone(), e))?,
    })
}

/// Load an already-admitted record by name.
///
/// Only a stat: admission validated the content once, and the resolver
/// trusts admitted records.
pub fn open(name: &str, config: &MediaConfig) -> Result<SourceImage, IntakeError> {
    let path = config.dir.join(name);
    let meta = match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Err(IntakeError::NotFound(name.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IntakeError::NotFound(name.to_string()));
        }
        Err(e) => return Err(IntakeError::Io(path, e)),
    };

    Ok(SourceImage {
        name: name.to_string(),
        mime: mime::from_path(&path),
        len: meta.len(),
        modified: meta
            .modified()
            .map_err(|e| IntakeError::Io(path.clone(), e))?,
        path,
    })
}

/// List all admitted images in the media directory, sorted by name.
///
/// Anything under `cache_dir` is skipped so a cache nested inside the media
/// directory is never treated as source material.
pub fn scan(config: &MediaConfig, cache_dir: &Path) -> Vec<SourceImage> {
    let mut images: Vec<SourceImage> = WalkDir::new(&config.dir)
        .skip_hidden(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            if path.starts_with(cache_dir) {
                return None;
            }
            let name = path
                .strip_prefix(&config.dir)
                .ok()?
                .to_str()?
                .to_string();
            if !config.is_allowed(mime::from_path(&path)) {
                return None;
            }
            open(&name, config).ok()
        })
        .collect();

    images.sort_by(|a, b| a.name.cmp(&b.name));
    images
}

fn validation(path: &Path, reason: impl Into<String>) -> IntakeError {
    IntakeError::ValidationFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// `<slug>-<fp8>.<ext>` from the original stem and the content bytes.
fn stable_name(src: &Path, bytes: &[u8], mime_type: &str) -> String {
    let stem = src
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = mime::extension_for(mime_type).unwrap_or("bin");
    format!("{}-{}.{ext}", slugify(stem), hash::fingerprint(bytes))
}

/// ASCII slug: transliterate, lowercase, collapse runs of non-alphanumerics
/// into single dashes.
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in deunicode::deunicode(value).to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() { "media".into() } else { slug }
}

/// Temp-write-then-rename so a partially-written upload is never visible
/// under its admitted name.
fn store_atomic(dest: &Path, bytes: &[u8], media_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(media_dir)?;

    let mut tmp_name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = dest.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
