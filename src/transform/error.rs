//! Transform error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by transform primitives and the final encode.
///
/// None of these are retried automatically; a failing step aborts the whole
/// pipeline for that request and the caller decides what to do.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid parameters for `{op}`: {reason}")]
    InvalidParams { op: &'static str, reason: String },

    #[error(
        "crop rectangle [{x},{y} {w}x{h}] exceeds image extent {width}x{height}"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported conversion: {0}")]
    UnsupportedConversion(String),

    #[error("failed to decode `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {format} output")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

impl TransformError {
    /// Shorthand for parameter errors.
    pub fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            op,
            reason: reason.into(),
        }
    }
}
