//! Cache keys for derivative requests.

use std::time::SystemTime;

use crate::intake::SourceImage;

/// Identifies a unique derivative request: blake3 over the source identity,
/// its modification marker and the filter-set name.
///
/// The modification time is part of the key, so replacing a source (same
/// name, new content) addresses a fresh path instead of overwriting; the
/// old derivative is orphaned, not evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey {
    hash: [u8; 32],
}

impl CacheKey {
    pub fn new(source: &SourceImage, filter_name: &str) -> Self {
        let mtime = source
            .modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();

        let mut hasher = blake3::Hasher::new();
        hasher.update(source.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&mtime.as_secs().to_le_bytes());
        hasher.update(&mtime.subsec_nanos().to_le_bytes());
        hasher.update(&[0]);
        hasher.update(filter_name.as_bytes());

        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// 16-char hex fingerprint, embedded in derivative filenames.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.hash[..8])
    }
}
