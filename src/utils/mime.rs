//! MIME type detection for media files.
//!
//! The intake allowlist is expressed in MIME types, so detection has to be
//! consistent everywhere: one extension table, one sniffing bridge.

use std::path::Path;

use image::ImageFormat;

/// MIME types for the image formats the pipeline can decode and encode.
pub mod types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WEBP: &str = "image/webp";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Guess MIME type from file extension.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("webp") => types::WEBP,
        _ => types::OCTET_STREAM,
    }
}

/// MIME type for a sniffed image format, if the pipeline supports it.
pub fn from_image_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some(types::PNG),
        ImageFormat::Jpeg => Some(types::JPEG),
        ImageFormat::WebP => Some(types::WEBP),
        _ => None,
    }
}

/// Canonical file extension for a supported MIME type.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        types::PNG => Some("png"),
        types::JPEG => Some("jpg"),
        types::WEBP => Some("webp"),
        _ => None,
    }
}

/// Check if the MIME type represents an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("photo.JPEG")), types::JPEG);
        assert_eq!(from_path(&PathBuf::from("banner.webp")), types::WEBP);
        assert_eq!(from_path(&PathBuf::from("notes.txt")), types::OCTET_STREAM);
        assert_eq!(from_path(&PathBuf::from("no_extension")), types::OCTET_STREAM);
    }

    #[test]
    fn test_extension_round_trip() {
        for mime in [types::PNG, types::JPEG, types::WEBP] {
            let ext = extension_for(mime).unwrap();
            assert_eq!(from_extension(Some(ext)), mime);
        }
        assert_eq!(extension_for(types::OCTET_STREAM), None);
    }

    #[test]
    fn test_from_image_format() {
        assert_eq!(from_image_format(ImageFormat::Png), Some(types::PNG));
        assert_eq!(from_image_format(ImageFormat::Gif), None);
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(types::PNG));
        assert!(!is_image(types::OCTET_STREAM));
    }
}
