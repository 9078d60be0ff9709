//! Short content fingerprints using FxHash.
//!
//! `rustc_hash::FxHasher` is fast and deterministic, which is all a
//! display-grade fingerprint needs. Cache keys use blake3 instead
//! (see `cache::key`): fingerprints here name files, they do not
//! guard correctness.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Compute hash and return as 8-char hex fingerprint.
///
/// Used for stable media filenames (e.g. `sunset-a1b2c3d4.jpg`).
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    format!("{:016x}", compute(value))[..8].to_string()
}
