//! The working buffer threaded through a filter set's steps.

use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader};

use super::encode::{InterlaceMode, OutputFormat};
use super::error::TransformError;

/// Embedded metadata captured from the source at decode time.
///
/// The encoders in this stack never copy metadata into the output on their
/// own; keeping the blobs here makes `strip-metadata` observable and leaves
/// room for carrying them forward where an encoder supports it.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub icc: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.icc.is_none() && self.exif.is_none()
    }
}

/// Pending encode settings, adjusted by `convert` and `interlace` steps.
#[derive(Debug, Clone)]
pub struct Encoding {
    /// Output format; starts as the source format.
    pub format: OutputFormat,
    /// Quality override from a `convert` step (else the set default wins).
    pub quality: Option<u8>,
    /// Requested pixel storage order.
    pub interlace: InterlaceMode,
}

/// Decoded pixels plus captured metadata and pending encode settings.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    pub metadata: Metadata,
    pub encoding: Encoding,
}

impl Frame {
    /// Decode a source file, capturing its ICC profile and Exif blob.
    pub fn decode(path: &Path) -> Result<Self, TransformError> {
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| TransformError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?;

        let format = reader
            .format()
            .and_then(OutputFormat::from_image_format)
            .ok_or_else(|| {
                TransformError::UnsupportedFormat(format!("`{}`", path.display()))
            })?;

        let mut decoder = reader.into_decoder().map_err(|source| TransformError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata = Metadata {
            icc: decoder.icc_profile().ok().flatten(),
            exif: decoder.exif_metadata().ok().flatten(),
        };

        let image =
            DynamicImage::from_decoder(decoder).map_err(|source| TransformError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            image,
            metadata,
            encoding: Encoding {
                format,
                quality: None,
                interlace: InterlaceMode::None,
            },
        })
    }

    /// Wrap an already-decoded image (no metadata).
    pub fn from_image(image: DynamicImage, format: OutputFormat) -> Self {
        Self {
            image,
            metadata: Metadata::default(),
            encoding: Encoding {
                format,
                quality: None,
                interlace: InterlaceMode::None,
            },
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Drop all captured metadata; pixels are untouched.
    pub fn strip_metadata(&mut self) {
        self.metadata = Metadata::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn decode_reads_dimensions_and_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fixture.png");
        let img = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255]));
        img.save(&path).unwrap();

        let frame = Frame::decode(&path).unwrap();
        assert_eq!(frame.dimensions(), (6, 4));
        assert_eq!(frame.encoding.format, OutputFormat::Png);
        assert!(frame.encoding.quality.is_none());
    }

    #[test]
    fn decode_guesses_format_from_content_not_extension() {
        // PNG bytes behind a .jpg extension still decode as PNG.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mislabelled.jpg");
        let img = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();

        let frame = Frame::decode(&path).unwrap();
        assert_eq!(frame.encoding.format, OutputFormat::Png);
    }

    #[test]
    fn decode_rejects_non_image_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"plain text").unwrap();

        assert!(matches!(
            Frame::decode(&path),
            Err(TransformError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn strip_metadata_clears_captured_blobs() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let mut frame = Frame::from_image(DynamicImage::ImageRgba8(img), OutputFormat::Png);
        frame.metadata.icc = Some(vec![1, 2, 3]);
        frame.metadata.exif = Some(vec![4, 5]);
        assert!(!frame.metadata.is_empty());

        frame.strip_metadata();
        assert!(frame.metadata.is_empty());
    }
}
